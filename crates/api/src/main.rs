use resto_api::Settings;

fn main() -> anyhow::Result<()> {
    resto_observability::init();

    let settings = Settings::from_env()?;
    if settings.debug {
        tracing::warn!("RESTO_DEBUG is on: failures answer with stack traces; never enable in deployment");
        if std::env::var_os("RUST_LIB_BACKTRACE").is_none() {
            // SAFETY: still single-threaded; the runtime is built below.
            unsafe { std::env::set_var("RUST_LIB_BACKTRACE", "1") };
        }
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(settings))
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let app = resto_api::app::build_app(&settings);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
