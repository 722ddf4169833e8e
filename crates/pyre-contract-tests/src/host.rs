#![forbid(unsafe_code)]

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pyre_core::EngineError;
    use pyre_host::{
        same_delegate, ClientApiVersion, FromContext, InputDelegate, PixelFormat, PointerEvent,
        RenderDelegate, SharedInput, SharedRenderer, SurfaceHost, SurfacePlatform,
    };

    /// Surface that only records what it is given.
    #[derive(Default)]
    struct Probe {
        formats: Vec<PixelFormat>,
        versions: Vec<ClientApiVersion>,
        renderer: Option<SharedRenderer<()>>,
        input: Option<SharedInput>,
    }

    impl std::fmt::Debug for Probe {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Probe").finish_non_exhaustive()
        }
    }

    impl SurfacePlatform for Probe {
        type Graphics = ();

        fn set_pixel_format(&mut self, format: PixelFormat) {
            self.formats.push(format);
        }

        fn set_client_api_version(&mut self, version: ClientApiVersion) {
            self.versions.push(version);
        }

        fn set_renderer(&mut self, renderer: SharedRenderer<()>) {
            self.renderer = Some(renderer);
        }

        fn set_input_handler(&mut self, handler: SharedInput) {
            self.input = Some(handler);
        }
    }

    struct Ctx;

    struct Frames;

    impl FromContext<Ctx> for Frames {
        fn from_context(_: &Ctx) -> Result<Self, EngineError> {
            Ok(Frames)
        }
    }

    impl RenderDelegate<()> for Frames {
        fn on_surface_created(&mut self, _: &()) -> Result<(), EngineError> {
            Ok(())
        }

        fn on_surface_changed(&mut self, _: &(), _: u32, _: u32) -> Result<(), EngineError> {
            Ok(())
        }

        fn on_draw_frame(&mut self, _: &()) -> Result<(), EngineError> {
            Ok(())
        }
    }

    struct Touches;

    impl FromContext<Ctx> for Touches {
        fn from_context(_: &Ctx) -> Result<Self, EngineError> {
            Ok(Touches)
        }
    }

    impl InputDelegate for Touches {
        fn on_pointer(&mut self, _: &PointerEvent) -> bool {
            true
        }
    }

    type Host = SurfaceHost<Probe, Frames, Touches>;

    #[test]
    fn surface_gets_exactly_the_fixed_configuration() {
        let host = Host::new(Probe::default(), &Ctx).expect("host");
        let p = host.platform();

        assert_eq!(p.formats.len(), 1);
        assert_eq!(p.formats[0].bits(), (8, 8, 8, 0, 16, 0));
        assert_eq!(p.versions, vec![ClientApiVersion(3)]);
    }

    #[test]
    fn installed_delegates_are_the_hosted_instances() {
        let host = Host::new(Probe::default(), &Ctx).expect("host");
        let p = host.platform();

        let renderer = p.renderer.as_ref().expect("renderer installed");
        let input = p.input.as_ref().expect("input installed");
        assert!(same_delegate(host.renderer(), renderer));
        assert!(same_delegate(host.listener(), input));
        assert!(!same_delegate(host.renderer(), input));
    }

    #[test]
    fn reinitialising_releases_the_previous_delegates() {
        let mut host = Host::new(Probe::default(), &Ctx).expect("host");
        let old_renderer = Arc::downgrade(host.renderer());
        let old_listener = Arc::downgrade(host.listener());

        host.init(&Ctx).expect("re-init");

        assert!(old_renderer.upgrade().is_none(), "old renderer still alive");
        assert!(old_listener.upgrade().is_none(), "old listener still alive");

        let p = host.platform();
        assert_eq!(p.formats.len(), 2);
        assert!(same_delegate(host.renderer(), p.renderer.as_ref().unwrap()));
        assert!(same_delegate(host.listener(), p.input.as_ref().unwrap()));
    }
}
