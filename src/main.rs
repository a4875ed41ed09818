use std::path::PathBuf;
use std::time::Duration;

use catfeina::markup::ElementKind;
use catfeina::models::{Category, Poem, PoemFilter};
use catfeina::screens::ScreenState;
use catfeina::{App, AppError, Config, Result};
use tokio::sync::watch;

const USAGE: &str = "\
Usage: catfeina [COMMAND]

  --import <seed.json>    import poems, notices and texts
  --list [CATEGORY]       list poems (POESIA, EXTRAS, TEATRO)
  --favorites             list favorite poems
  --read                  list poems already read
  --search <term>         search titles and bodies
  --show <id>             print one poem
  --favorite <id>         toggle the favorite mark of a poem
  --notice <key>          print an informational page
  --settings              print display settings";

#[tokio::main]
async fn main() -> Result<()> {
    // Only warnings and errors unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::load()?;
    let app = App::new(&config).await?;

    let command = args.first().map(String::as_str).unwrap_or("--list");
    let argument = args.get(1).map(String::as_str);

    match (command, argument) {
        ("--import", Some(path)) => {
            let report = app.import_seed(&PathBuf::from(path)).await?;
            println!(
                "Imported {} poems, {} notices, {} texts from {}",
                report.poems, report.notices, report.texts, path
            );
        }
        ("--list", None) => print_list(&app, PoemFilter::All).await?,
        ("--list", Some(category)) => {
            let category: Category = category
                .parse()
                .map_err(|_| AppError::Invalid(format!("unknown category {category}")))?;
            print_list(&app, PoemFilter::Category(category)).await?;
        }
        ("--favorites", None) => print_list(&app, PoemFilter::Favorites).await?,
        ("--read", None) => print_list(&app, PoemFilter::Read).await?,
        ("--search", Some(term)) => print_list(&app, PoemFilter::Search(term.to_string())).await?,
        ("--show", Some(id)) => show_poem(&app, parse_id(id)?).await?,
        ("--favorite", Some(id)) => {
            let id = parse_id(id)?;
            let mut screen = app.poem_detail(id);
            settle(screen.state()).await?;
            if screen.toggle_favorite().await?.is_none() {
                println!("No poem with id {id}");
            }
            while let Some(message) = screen.messages().poll() {
                println!("{}", message.feedback());
            }
        }
        ("--notice", Some(key)) => {
            let screen = app.notice(Some(key.to_string()));
            match settle(screen.state()).await? {
                ScreenState::Ready(view) => {
                    if let Some(title) = &view.notice.title {
                        println!("{title}\n");
                    }
                    print_elements(&view.elements);
                }
                ScreenState::NotFound => println!("No notice stored under {key:?}"),
                other => report_state(&other),
            }
        }
        ("--settings", None) => {
            let settings = app.preferences.current().await;
            println!("theme_mode = {}", settings.theme_mode);
            println!("base_theme = {}", settings.base_theme);
            println!("dark_mode = {}", settings.dark_mode);
            println!("font_scale = {:.1}", settings.font_scale);
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::Invalid(format!("poem id {raw:?}")))
}

/// Wait for a screen to leave `Loading`.
async fn settle<T: Clone>(mut rx: watch::Receiver<ScreenState<T>>) -> Result<ScreenState<T>> {
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| !s.is_loading()))
        .await
        .map_err(|_| anyhow::anyhow!("Timed out waiting for the content database"))?
        .map_err(|e| anyhow::anyhow!("Screen closed before loading: {}", e))?;
    Ok(state.clone())
}

async fn print_list(app: &App, filter: PoemFilter) -> Result<()> {
    let screen = app.poem_list(filter);
    match settle(screen.state()).await? {
        ScreenState::Ready(poems) if poems.is_empty() => println!("No poems"),
        ScreenState::Ready(poems) => poems.iter().for_each(print_row),
        other => report_state(&other),
    }
    Ok(())
}

fn print_row(poem: &Poem) {
    let favorite = if poem.is_favorite() { "*" } else { " " };
    let read = if poem.is_read() { "r" } else { " " };
    println!(
        "{:>5} {}{} {:<7} {}",
        poem.id, favorite, read, poem.category.as_str(), poem.title
    );
}

async fn show_poem(app: &App, id: i64) -> Result<()> {
    let screen = app.poem_detail(id);
    match settle(screen.state()).await? {
        ScreenState::Ready(detail) => {
            println!("{}\n", detail.poem.title);
            print_elements(&detail.elements);
            if !detail.poem.closing.is_empty() {
                println!("\n{}", detail.poem.closing);
            }
            if !detail.poem.image.is_empty() {
                match app.image_uri(&detail.poem.image) {
                    Ok(uri) => println!("\n[{}]", uri),
                    Err(e) => tracing::warn!("Bad image path for poem {}: {}", id, e),
                }
            }
        }
        ScreenState::NotFound => println!("No poem with id {id}"),
        other => report_state(&other),
    }
    Ok(())
}

fn print_elements(elements: &[catfeina::markup::ContentElement]) {
    for element in elements {
        match &element.kind {
            ElementKind::Paragraph(block) => println!("{}\n", block.text()),
            ElementKind::Header { level, block } => {
                println!("{} {}\n", "#".repeat(*level as usize), block.text())
            }
            ElementKind::Quote(block) => {
                for line in block.text().lines() {
                    println!("  > {line}");
                }
                println!();
            }
            ElementKind::ListItem(block) => println!("  - {}", block.text()),
            ElementKind::Image { file, alt } => {
                println!("[image {}{}]\n", file, alt.as_deref().map(|a| format!(": {a}")).unwrap_or_default())
            }
            ElementKind::HorizontalRule => println!("----\n"),
        }
    }
}

fn report_state<T>(state: &ScreenState<T>) {
    match state {
        ScreenState::Failed(message) => eprintln!("Error: {message}"),
        ScreenState::MissingKey => eprintln!("Error: no key given"),
        _ => {}
    }
}
