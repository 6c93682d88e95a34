#![deny(warnings)]

use persistence::default_sqlite_url;

#[tokio::main]
async fn main() -> Result<(), persistence::PersistError> {
    let url = default_sqlite_url();
    // Ensure directory and file exist before sqlx connects.
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"));
    if let Some(path) = path {
        if let Some(parent) = std::path::Path::new(path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .append(true)
            .open(path);
    }
    let _pool = persistence::init_db(url).await?;
    println!("Simulation store migrated at {url}");
    Ok(())
}
