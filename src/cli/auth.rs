use anyhow::Result;

use crate::core::AppConfig;

/// Make sure a usable credential is cached without creating an event.
pub async fn run(config: &AppConfig, open_browser: bool) -> Result<()> {
    let publisher = super::publisher(config, open_browser);
    let credential = publisher.credential().await?;

    match credential.expiry {
        Some(expiry) => println!(
            "Credential cached at {} (expires {})",
            publisher.store().path().display(),
            expiry
        ),
        None => println!(
            "Credential cached at {}",
            publisher.store().path().display()
        ),
    }

    Ok(())
}
