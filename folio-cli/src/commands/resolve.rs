//! Resolve posts, tabs and languages of a site.

use crate::site::{open_site, SiteTarget};
use anyhow::Result;
use folio_core::models::published;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct PostsOptions {
    pub eager: bool,
    pub published: bool,
    pub pretty: bool,
}

/// Print the posts result map for `lang` as JSON.
pub async fn show_posts(target: &SiteTarget, lang: &str, opts: PostsOptions) -> Result<()> {
    let (config, assembler) = open_site(target)?;

    let load = assembler
        .load(&config.content.root, &config.content.posts, lang)
        .await;
    let entries = if opts.eager {
        load.entries
    } else {
        load.into_settled().await
    };

    if opts.published {
        print_json(&published(&entries), opts.pretty)
    } else {
        print_json(&entries, opts.pretty)
    }
}

/// Print the tabs map for `lang` as JSON.
pub async fn show_tabs(target: &SiteTarget, lang: &str, pretty: bool) -> Result<()> {
    let (config, assembler) = open_site(target)?;
    let tabs = assembler
        .load_tabs(&config.content.root, &config.content.tabs, lang)
        .await;
    print_json(&tabs, pretty)
}

/// Print the languages declared by the posts index, one per line.
pub async fn show_languages(target: &SiteTarget) -> Result<()> {
    let (config, assembler) = open_site(target)?;
    let langs = assembler
        .available_languages(&config.content.root, &config.content.posts)
        .await;

    if langs.is_empty() {
        println!("{}", config.default_language());
    }
    for lang in langs {
        println!("{lang}");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
