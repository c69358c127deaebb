use crate::app::{AppContext, Result};
use crate::pipeline::log_summary;

pub async fn run(ctx: &AppContext, dry_run: bool) -> Result<()> {
    if dry_run {
        let digest = ctx.pipeline.build_digest().await;
        log_summary(&digest.summary);
        println!("{}", digest.markdown);
        return Ok(());
    }

    let receipt = ctx.pipeline.run().await?;
    println!("{}", receipt);
    Ok(())
}

pub async fn fetch_feed(ctx: &AppContext, url: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(ctx.config.top_k_per_source);
    let items = ctx.pipeline.sources().fetch(url, limit).await;

    for (i, item) in items.iter().enumerate() {
        if item.is_sentinel() {
            println!("No items from {}", url);
            continue;
        }
        println!("{}. {}", i + 1, item.title);
        println!("   [{}] {}", item.source_host, item.link);
        if !item.published.is_empty() {
            println!("   {}", item.published);
        }
    }
    Ok(())
}

pub async fn translate_titles(ctx: &AppContext, titles: &[String]) -> Result<()> {
    let translation = ctx.pipeline.translator().run(titles).await;
    for line in &translation.titles {
        println!("{}", line);
    }
    tracing::info!("Translated by {}", translation.provider.unwrap_or("none"));
    Ok(())
}
