/// Console logging setup
///
/// `RUST_LOG` controls the filter (default: `image_upload=info`), e.g.
/// `RUST_LOG=image_upload=debug image-upload`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "image_upload=info";

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
    {
        eprintln!("⚠️  Logging already initialized: {}", e);
    }
}
