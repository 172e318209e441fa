pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter("info,polyform_geometry=debug")
        .init();
}
