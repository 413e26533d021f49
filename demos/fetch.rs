use relfetch::{Api, FetchOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relfetch=info")),
        )
        .init();

    // Is there anything newer than what we have?
    let api = Api::new().set_destination("./mailpit");
    let repo = match api.repo("axllent/mailpit") {
        Ok(repo) => repo,
        Err(e) => return eprintln!("bad repository: {e}"),
    };
    match repo.is_update_available("v1.0.0").await {
        Ok(available) => println!("update available: {available}"),
        Err(e) => eprintln!("error checking for update: {e}"),
    }

    // Download and unpack the latest release for this platform
    match repo.latest().fetch().await {
        Ok(files) => println!("mailpit installed: {files:?}"),
        Err(e) => eprintln!("error installing mailpit: {e}"),
    }

    // Download a specific version, keeping the archive packed
    let result = relfetch::fetch_release_by_tag(
        FetchOptions::new("axllent", "mailpit")
            .destination("./mailpit-archive")
            .should_extract(false),
        "v1.21.0",
    )
    .await;

    match result {
        Ok(files) => println!("archive downloaded: {files:?}"),
        Err(e) => eprintln!("error downloading archive: {e}"),
    }
}
