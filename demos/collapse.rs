//! Basic usage example for navfold
//!
//! Run with: cargo run --example collapse

use navfold::{collapse, CollapseConfig, Page, Result};

const CHANGELIST: &str = r#"<!DOCTYPE html>
<html>
<head><title>Select report to change | Site admin</title></head>
<body>
  <table id="result_list"><tr><td>March report</td></tr></table>
  <nav id="changelist-filter">
    <h2>Filter</h2>
    <details open><summary>By active</summary>
      <ul><li><a href="?is_active=1">Yes</a></li></ul>
    </details>
    <details open><summary>By role</summary>
      <ul><li><a href="?role=manager">Manager</a></li></ul>
    </details>
  </nav>
</body>
</html>"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let page = Page::new();

    // Fold the filter panel on every load
    collapse::install(&page, CollapseConfig::default()).await;

    println!("Loading changelist page...");
    page.load(CHANGELIST).await?;

    let state = page.debug_state().await?;
    println!("Title: {}", state.title);
    println!(
        "Disclosure widgets: {} ({} still expanded)",
        state.widget_count, state.expanded_count
    );

    println!("\nCollapsed page:\n{}", page.content().await?);
    Ok(())
}
