use glow::HasContext;
use pyre_core::EngineError;
use pyre_sim::GridSize;

/// Storage layout of a volume texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeFormat {
    /// One half-float channel (density, temperature, pressure).
    Scalar,
    /// Four half-float channels, xyz used (velocity, curl, noise).
    Vector,
}

impl VolumeFormat {
    pub fn internal_format(self) -> u32 {
        match self {
            VolumeFormat::Scalar => glow::R16F,
            VolumeFormat::Vector => glow::RGBA16F,
        }
    }

    pub fn pixel_format(self) -> u32 {
        match self {
            VolumeFormat::Scalar => glow::RED,
            VolumeFormat::Vector => glow::RGBA,
        }
    }

    pub fn components(self) -> usize {
        match self {
            VolumeFormat::Scalar => 1,
            VolumeFormat::Vector => 4,
        }
    }
}

/// Widen xyz triples to the RGBA layout of [`VolumeFormat::Vector`].
pub fn expand_vec3(data: &[[f32; 3]]) -> Vec<f32> {
    data.iter().flat_map(|v| [v[0], v[1], v[2], 0.0]).collect()
}

/// A 3D texture with linear filtering.
#[derive(Debug)]
pub struct VolumeTexture {
    pub tex: glow::NativeTexture,
    pub size: GridSize,
    pub format: VolumeFormat,
}

impl VolumeTexture {
    /// Allocate zeroed storage. `wrap` is `CLAMP_TO_EDGE` for fields, `REPEAT` for tiles.
    pub unsafe fn new(
        gl: &glow::Context,
        size: GridSize,
        format: VolumeFormat,
        wrap: u32,
    ) -> Result<Self, EngineError> {
        let tex = gl
            .create_texture()
            .map_err(|e| EngineError::GlCreate(format!("create_texture failed: {e:?}")))?;

        gl.bind_texture(glow::TEXTURE_3D, Some(tex));
        gl.tex_parameter_i32(glow::TEXTURE_3D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_3D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_3D, glow::TEXTURE_WRAP_S, wrap as i32);
        gl.tex_parameter_i32(glow::TEXTURE_3D, glow::TEXTURE_WRAP_T, wrap as i32);
        gl.tex_parameter_i32(glow::TEXTURE_3D, glow::TEXTURE_WRAP_R, wrap as i32);
        gl.bind_texture(glow::TEXTURE_3D, None);

        let vol = Self { tex, size, format };
        vol.clear(gl)?;
        Ok(vol)
    }

    /// Replace the whole texture; `data` holds `components()` floats per voxel.
    pub unsafe fn upload(&self, gl: &glow::Context, data: &[f32]) -> Result<(), EngineError> {
        let expected = self.size.voxel_count() * self.format.components();
        if data.len() != expected {
            return Err(EngineError::other(format!(
                "volume upload expects {expected} floats, got {}",
                data.len()
            )));
        }
        gl.bind_texture(glow::TEXTURE_3D, Some(self.tex));
        gl.tex_image_3d(
            glow::TEXTURE_3D,
            0,
            self.format.internal_format() as i32,
            self.size.width as i32,
            self.size.height as i32,
            self.size.depth as i32,
            0,
            self.format.pixel_format(),
            glow::FLOAT,
            Some(bytemuck::cast_slice(data)),
        );
        gl.bind_texture(glow::TEXTURE_3D, None);
        Ok(())
    }

    pub unsafe fn upload_vec3(
        &self,
        gl: &glow::Context,
        data: &[[f32; 3]],
    ) -> Result<(), EngineError> {
        self.upload(gl, &expand_vec3(data))
    }

    pub unsafe fn clear(&self, gl: &glow::Context) -> Result<(), EngineError> {
        let zeros = vec![0.0f32; self.size.voxel_count() * self.format.components()];
        self.upload(gl, &zeros)
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_texture(self.tex);
    }
}

/// Ping-pong pair: operations read `data()` and render into `result()`, then `swap()`.
#[derive(Debug)]
pub struct DataTexturePair {
    data: VolumeTexture,
    result: VolumeTexture,
}

impl DataTexturePair {
    pub unsafe fn new(
        gl: &glow::Context,
        size: GridSize,
        format: VolumeFormat,
    ) -> Result<Self, EngineError> {
        let data = VolumeTexture::new(gl, size, format, glow::CLAMP_TO_EDGE)?;
        let result = VolumeTexture::new(gl, size, format, glow::CLAMP_TO_EDGE)?;
        Ok(Self { data, result })
    }

    pub fn data(&self) -> &VolumeTexture {
        &self.data
    }

    pub fn result(&self) -> &VolumeTexture {
        &self.result
    }

    pub fn size(&self) -> GridSize {
        self.data.size
    }

    pub fn format(&self) -> VolumeFormat {
        self.data.format
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.data, &mut self.result);
    }

    pub unsafe fn upload(&self, gl: &glow::Context, data: &[f32]) -> Result<(), EngineError> {
        self.data.upload(gl, data)
    }

    pub unsafe fn upload_vec3(
        &self,
        gl: &glow::Context,
        data: &[[f32; 3]],
    ) -> Result<(), EngineError> {
        self.data.upload_vec3(gl, data)
    }

    pub unsafe fn clear(&self, gl: &glow::Context) -> Result<(), EngineError> {
        self.data.clear(gl)?;
        self.result.clear(gl)
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.data.destroy(gl);
        self.result.destroy(gl);
    }
}

/// Temporaries keyed by grid size and layout, reused across frames.
#[derive(Debug)]
pub struct ScratchPool<T> {
    entries: Vec<((GridSize, VolumeFormat), T)>,
}

impl<T> Default for ScratchPool<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> ScratchPool<T> {
    /// The entry for (`size`, `format`), created with `make` on first use.
    pub fn get_or_try_insert<E>(
        &mut self,
        size: GridSize,
        format: VolumeFormat,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        let key = (size, format);
        let idx = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                self.entries.push((key, make()?));
                self.entries.len() - 1
            }
        };
        Ok(&self.entries[idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hand every entry back to the caller, leaving the pool empty.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.entries.drain(..).map(|(_, t)| t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_is_shared_per_size_and_released_on_drain() {
        let small = GridSize::new(4, 8, 4);
        let large = GridSize::new(8, 16, 8);
        let mut pool: ScratchPool<u32> = ScratchPool::default();
        let mut made = 0;
        let mut make = || -> Result<u32, ()> {
            made += 1;
            Ok(made)
        };

        assert_eq!(pool.get_or_try_insert(small, VolumeFormat::Scalar, &mut make), Ok(&1));
        assert_eq!(pool.get_or_try_insert(small, VolumeFormat::Scalar, &mut make), Ok(&1));
        assert_eq!(pool.get_or_try_insert(small, VolumeFormat::Vector, &mut make), Ok(&2));
        assert_eq!(pool.get_or_try_insert(large, VolumeFormat::Scalar, &mut make), Ok(&3));
        assert_eq!(pool.len(), 3);

        let released: Vec<u32> = pool.drain().collect();
        assert_eq!(released, vec![1, 2, 3]);
        assert!(pool.is_empty());
    }

    #[test]
    fn failed_scratch_creation_is_not_cached() {
        let mut pool: ScratchPool<u32> = ScratchPool::default();
        let size = GridSize::new(2, 2, 2);
        assert_eq!(
            pool.get_or_try_insert(size, VolumeFormat::Scalar, || Err("no memory")),
            Err("no memory")
        );
        assert!(pool.is_empty());
    }

    #[test]
    fn vector_layout_pads_to_rgba() {
        let out = expand_vec3(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0]);
        assert_eq!(VolumeFormat::Vector.components(), 4);
        assert_eq!(VolumeFormat::Scalar.internal_format(), glow::R16F);
    }
}
