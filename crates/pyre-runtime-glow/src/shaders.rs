//! GLSL ES 3.00 sources.
//!
//! Slab programs render one depth layer of a 3D texture per draw; the fragment's cell is
//! `(gl_FragCoord.xy, uLayer)`.

pub const FULLSCREEN_VERT: &str = r#"#version 300 es
layout (location = 0) in vec2 a_pos;
layout (location = 1) in vec2 a_uv;
out vec2 v_uv;
void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_pos, 0.0, 1.0);
}
"#;

macro_rules! slab_shader {
    ($body:literal) => {
        concat!(
            r#"#version 300 es
precision highp float;
precision highp int;
precision highp sampler3D;

uniform int uLayer;
uniform ivec3 uGridSize;
out vec4 o;

ivec3 cell() { return ivec3(ivec2(gl_FragCoord.xy), uLayer); }
vec3 cellUvw(ivec3 c) { return (vec3(c) + 0.5) / vec3(uGridSize); }
vec4 at(sampler3D s, ivec3 c) { return texelFetch(s, c, 0); }
"#,
            $body
        )
    };
}

/// Shell cells copy their inward neighbour times `uScale`; interior cells pass through.
pub const BOUNDARY_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uData;
uniform float uScale;
void main() {
    ivec3 c = cell();
    ivec3 inner = clamp(c, ivec3(1), uGridSize - 2);
    o = (c == inner) ? at(uData, c) : at(uData, inner) * uScale;
}
"#
);

pub const COPY_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uData;
void main() { o = at(uData, cell()); }
"#
);

/// Semi-Lagrangian advection; `uDh` is the data grid's cell size in simulation units.
pub const ADVECT_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uVelocity;
uniform sampler3D uData;
uniform float uDt;
uniform float uDh;
void main() {
    ivec3 c = cell();
    vec3 v = texture(uVelocity, cellUvw(c)).xyz;
    vec3 back = vec3(c) + 0.5 - v * uDt / uDh;
    o = texture(uData, back / vec3(uGridSize));
}
"#
);

pub const BUOYANCY_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uVelocity;
uniform sampler3D uTemperature;
uniform float uDt;
uniform float uScale;
uniform float uSourceTemperature;
uniform vec3 uUp;
void main() {
    ivec3 c = cell();
    float t = texture(uTemperature, cellUvw(c)).r;
    vec3 lift = uDt * uScale * (t / uSourceTemperature) * 9.81 * uUp;
    o = at(uVelocity, c) + vec4(lift, 0.0);
}
"#
);

/// Fourth-power radiative cooling relative to the source temperature.
pub const COOLING_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uData;
uniform float uDt;
uniform float uRate;
uniform float uSourceTemperature;
void main() {
    float t = at(uData, cell()).r;
    float n = t / uSourceTemperature;
    o = vec4(max(t - uDt * uRate * n * n * n * n * uSourceTemperature, 0.0));
}
"#
);

pub const ADD_SOURCE_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uData;
uniform sampler3D uSource;
uniform float uDt;
void main() {
    ivec3 c = cell();
    o = at(uData, c) + uDt * texture(uSource, cellUvw(c));
}
"#
);

/// Scalars keep the larger of field and source; vectors take the source where it is set.
pub const SET_SOURCE_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uData;
uniform sampler3D uSource;
uniform int uVector;
void main() {
    ivec3 c = cell();
    vec4 d = at(uData, c);
    vec4 s = texture(uSource, cellUvw(c));
    if (uVector == 1) {
        o = any(notEqual(s.xyz, vec3(0.0))) ? s : d;
    } else {
        o = max(d, s);
    }
}
"#
);

pub const DISSIPATE_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uData;
uniform float uDt;
uniform float uRate;
void main() { o = at(uData, cell()) / (1.0 + uDt * uRate); }
"#
);

pub const JACOBI_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uX;
uniform sampler3D uB;
uniform float uAlpha;
uniform float uRBeta;
void main() {
    ivec3 c = cell();
    vec4 sum = at(uX, c + ivec3(-1, 0, 0)) + at(uX, c + ivec3(1, 0, 0))
             + at(uX, c + ivec3(0, -1, 0)) + at(uX, c + ivec3(0, 1, 0))
             + at(uX, c + ivec3(0, 0, -1)) + at(uX, c + ivec3(0, 0, 1));
    o = (sum + uAlpha * at(uB, c)) * uRBeta;
}
"#
);

pub const DIVERGENCE_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uVelocity;
uniform float uHalfInvDh;
void main() {
    ivec3 c = cell();
    float div = at(uVelocity, c + ivec3(1, 0, 0)).x - at(uVelocity, c - ivec3(1, 0, 0)).x
              + at(uVelocity, c + ivec3(0, 1, 0)).y - at(uVelocity, c - ivec3(0, 1, 0)).y
              + at(uVelocity, c + ivec3(0, 0, 1)).z - at(uVelocity, c - ivec3(0, 0, 1)).z;
    o = vec4(uHalfInvDh * div);
}
"#
);

pub const GRADIENT_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uVelocity;
uniform sampler3D uPressure;
uniform float uHalfInvDh;
void main() {
    ivec3 c = cell();
    vec3 grad = vec3(
        at(uPressure, c + ivec3(1, 0, 0)).r - at(uPressure, c - ivec3(1, 0, 0)).r,
        at(uPressure, c + ivec3(0, 1, 0)).r - at(uPressure, c - ivec3(0, 1, 0)).r,
        at(uPressure, c + ivec3(0, 0, 1)).r - at(uPressure, c - ivec3(0, 0, 1)).r);
    o = at(uVelocity, c) - vec4(uHalfInvDh * grad, 0.0);
}
"#
);

pub const CURL_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uVelocity;
uniform float uHalfInvDh;
void main() {
    ivec3 c = cell();
    vec3 l = at(uVelocity, c - ivec3(1, 0, 0)).xyz;
    vec3 r = at(uVelocity, c + ivec3(1, 0, 0)).xyz;
    vec3 d = at(uVelocity, c - ivec3(0, 1, 0)).xyz;
    vec3 u = at(uVelocity, c + ivec3(0, 1, 0)).xyz;
    vec3 b = at(uVelocity, c - ivec3(0, 0, 1)).xyz;
    vec3 f = at(uVelocity, c + ivec3(0, 0, 1)).xyz;
    vec3 w = vec3((u.z - d.z) - (f.y - b.y),
                  (f.x - b.x) - (r.z - l.z),
                  (r.y - l.y) - (u.x - d.x));
    o = vec4(uHalfInvDh * w, 0.0);
}
"#
);

pub const VORTICITY_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uVelocity;
uniform sampler3D uCurl;
uniform float uDt;
uniform float uScale;
uniform float uDh;
void main() {
    ivec3 c = cell();
    vec3 w = at(uCurl, c).xyz;
    vec3 eta = 0.5 / uDh * vec3(
        length(at(uCurl, c + ivec3(1, 0, 0)).xyz) - length(at(uCurl, c - ivec3(1, 0, 0)).xyz),
        length(at(uCurl, c + ivec3(0, 1, 0)).xyz) - length(at(uCurl, c - ivec3(0, 1, 0)).xyz),
        length(at(uCurl, c + ivec3(0, 0, 1)).xyz) - length(at(uCurl, c - ivec3(0, 0, 1)).xyz));
    vec3 n = eta / (length(eta) + 1e-5);
    vec3 force = uScale * uDh * cross(n, w);
    o = at(uVelocity, c) + vec4(uDt * force, 0.0);
}
"#
);

/// Uniform acceleration (wind).
pub const FORCE_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uVelocity;
uniform float uDt;
uniform vec3 uForce;
void main() { o = at(uVelocity, cell()) + vec4(uDt * uForce, 0.0); }
"#
);

/// Gaussian impulse centred at `uPosition` (cells).
pub const SPLAT_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uVelocity;
uniform vec3 uPosition;
uniform vec3 uForce;
uniform float uRadius;
void main() {
    ivec3 c = cell();
    vec3 d = vec3(c) + 0.5 - uPosition;
    float w = exp(-dot(d, d) / (uRadius * uRadius));
    o = at(uVelocity, c) + vec4(w * uForce, 0.0);
}
"#
);

/// Upsample the coarse velocity and add band noise scaled by the local speed.
pub const TURBULENCE_FRAG: &str = slab_shader!(
    r#"
uniform sampler3D uVelocity;
uniform sampler3D uNoise;
uniform vec3 uNoiseScale;
uniform float uStrength;
void main() {
    vec3 uvw = cellUvw(cell());
    vec3 v = texture(uVelocity, uvw).xyz;
    vec3 n = texture(uNoise, uvw * uNoiseScale).xyz;
    o = vec4(v + uStrength * length(v) * n, 0.0);
}
"#
);

/// Front-to-back ray march through the unit cube. Smoke absorbs, hot gas emits
/// blackbody light sampled at three wavelengths (µm).
pub const RAY_MARCH_FRAG: &str = r#"#version 300 es
precision highp float;
precision highp sampler3D;

in vec2 v_uv;
out vec4 o;

uniform sampler3D uDensity;
uniform sampler3D uTemperature;
uniform mat4 uInvMvp;
uniform vec3 uSimulationSize;
uniform vec3 uBackground;
uniform vec3 uFilter;
uniform vec3 uColorSpace;
uniform vec3 uLambda;
uniform float uEmissionScale;
uniform float uAbsorption;
uniform int uSteps;

const float C1 = 1.19104297e8;
const float C2 = 1.4387769e4;

vec3 planck(float t) {
    if (t < 300.0) return vec3(0.0);
    vec3 l5 = uLambda * uLambda * uLambda * uLambda * uLambda;
    return C1 / (l5 * (exp(C2 / (uLambda * t)) - 1.0));
}

vec3 unproject(vec2 ndc, float z) {
    vec4 p = uInvMvp * vec4(ndc, z, 1.0);
    return p.xyz / p.w;
}

void main() {
    vec2 ndc = v_uv * 2.0 - 1.0;
    vec3 ro = unproject(ndc, -1.0);
    vec3 rd = normalize(unproject(ndc, 1.0) - ro);

    vec3 inv = 1.0 / rd;
    vec3 t0 = (vec3(0.0) - ro) * inv;
    vec3 t1 = (vec3(1.0) - ro) * inv;
    vec3 tmin = min(t0, t1);
    vec3 tmax = max(t0, t1);
    float tEnter = max(max(max(tmin.x, tmin.y), tmin.z), 0.0);
    float tExit = min(min(tmax.x, tmax.y), tmax.z);

    vec3 light = vec3(0.0);
    float transmittance = 1.0;
    if (tExit > tEnter) {
        float dt = (tExit - tEnter) / float(uSteps);
        float ds = dt * length(rd * uSimulationSize);
        for (int i = 0; i < uSteps; i++) {
            vec3 p = ro + rd * (tEnter + (float(i) + 0.5) * dt);
            float density = texture(uDensity, p).r;
            float temperature = texture(uTemperature, p).r;
            light += transmittance * planck(temperature) * uEmissionScale * ds;
            transmittance *= exp(-uAbsorption * density * ds);
            if (transmittance < 0.01) break;
        }
    }

    vec3 color = pow(max(light, vec3(0.0)), 1.0 / uColorSpace) * uFilter;
    o = vec4(color + transmittance * uBackground, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    const SLAB: [&str; 15] = [
        BOUNDARY_FRAG,
        COPY_FRAG,
        ADVECT_FRAG,
        BUOYANCY_FRAG,
        COOLING_FRAG,
        ADD_SOURCE_FRAG,
        SET_SOURCE_FRAG,
        DISSIPATE_FRAG,
        JACOBI_FRAG,
        DIVERGENCE_FRAG,
        GRADIENT_FRAG,
        CURL_FRAG,
        VORTICITY_FRAG,
        FORCE_FRAG,
        SPLAT_FRAG,
    ];

    #[test]
    fn every_program_targets_gles3() {
        for src in SLAB
            .iter()
            .chain([TURBULENCE_FRAG, RAY_MARCH_FRAG, FULLSCREEN_VERT].iter())
        {
            assert!(src.starts_with("#version 300 es\n"));
            assert_eq!(src.matches('{').count(), src.matches('}').count());
            assert_eq!(src.matches("void main()").count(), 1);
        }
    }

    #[test]
    fn slab_programs_share_the_layer_prelude() {
        for src in SLAB {
            assert!(src.contains("uniform int uLayer;"));
            assert!(src.contains("uniform ivec3 uGridSize;"));
        }
    }

    #[test]
    fn ray_march_constants_match_cpu_blackbody() {
        use pyre_sim::blackbody::{PLANCK_C1, PLANCK_C2};
        assert!((PLANCK_C1 - 1.19104297e8).abs() < 1.0);
        assert!((PLANCK_C2 - 1.4387769e4).abs() < 1e-3);
        assert!(RAY_MARCH_FRAG.contains("1.19104297e8"));
        assert!(RAY_MARCH_FRAG.contains("1.4387769e4"));
    }
}
