// UI layer: wraps the search call in a progress spinner with cursor and
// interrupt cleanup, then renders the best match with colored fields.

use crate::api::{SceneMatch, SearchClient, SearchResponse};
use anyhow::{Context, Result};
use crossterm::style::{Color, StyledContent, Stylize};
use crossterm::{cursor, execute};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Search by a local image file and print the best match.
pub fn search_file(api: &SearchClient, path: &Path) -> Result<()> {
    // Checked up front so a bad path never starts the spinner or touches
    // the network.
    if !path.exists() {
        anyhow::bail!("Invalid file path: {}", path.display());
    }

    let response = run_with_spinner(|| api.search_by_file(path))?;
    let scene = response.best_match()?;
    println!("{}", "✔️  Found!".green());
    render_match(&mut io::stdout(), scene)?;
    Ok(())
}

/// Search by a direct image URL and print the best match.
pub fn search_url(api: &SearchClient, image_url: &str) -> Result<()> {
    let response = run_with_spinner(|| api.search_by_url(image_url))?;
    let scene = response.best_match()?;
    println!("{}", "✔️  Found!".green());
    render_match(&mut io::stdout(), scene)?;
    Ok(())
}

/// Runs the request with the cursor hidden and a spinner ticking. The
/// cursor is restored on every exit path (the guard's Drop also runs on
/// unwind), and a Ctrl-C during the request cleans up and exits.
fn run_with_spinner<F>(request: F) -> Result<SearchResponse>
where
    F: FnOnce() -> Result<SearchResponse>,
{
    let _cursor = CursorGuard::hide();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message("🔎 Searching for the anime...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let _interrupt = arm_interrupt(&spinner)?;

    let outcome = request();
    spinner.finish_and_clear();
    outcome
}

/// Hides the terminal cursor until dropped.
struct CursorGuard;

impl CursorGuard {
    fn hide() -> Self {
        let _ = execute!(io::stdout(), cursor::Hide);
        CursorGuard
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show);
    }
}

/// Disarms the interrupt handler's terminal cleanup when dropped. The
/// handler itself stays registered (ctrlc handlers cannot be removed), but
/// once the search is over it no longer owns spinner or cursor state.
struct InterruptGuard {
    armed: Arc<AtomicBool>,
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

/// Installs a Ctrl-C listener that stops the spinner, restores the cursor
/// and exits immediately without printing a result.
fn arm_interrupt(spinner: &ProgressBar) -> Result<InterruptGuard> {
    let armed = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&armed);
    let spinner = spinner.clone();
    ctrlc::set_handler(move || {
        if flag.load(Ordering::SeqCst) {
            spinner.finish_and_clear();
            let _ = execute!(io::stdout(), cursor::Show);
        }
        process::exit(130);
    })
    .context("Failed to install interrupt handler")?;
    Ok(InterruptGuard { armed })
}

/// Writes the eight labeled fields of a match in fixed order.
fn render_match(out: &mut impl Write, scene: &SceneMatch) -> io::Result<()> {
    let title = &scene.anilist.title;
    writeln!(out, "🌸 Title Native: {}", title.native.as_deref().unwrap_or(""))?;
    writeln!(out, "🗻 Title Romaji: {}", title.romaji.as_deref().unwrap_or(""))?;
    writeln!(out, "🗽 Title English: {}", title.english.as_deref().unwrap_or(""))?;
    writeln!(
        out,
        "📊 Similarity: {}",
        format!("{:.6}", scene.similarity).with(similarity_color(scene.similarity))
    )?;
    writeln!(
        out,
        "📺 Episode Number: {}",
        scene.episode.unwrap_or(0).to_string().magenta()
    )?;
    writeln!(out, "⌚ Scene From: {}", format_timestamp(scene.from).magenta())?;
    writeln!(out, "⌚ Scene To: {}", format_timestamp(scene.to).magenta())?;
    writeln!(out, "🍓 Is Adult: {}", adult_label(scene.anilist.is_adult))
}

/// Color policy for the similarity score: high similarity reads as
/// success, low as a warning.
fn similarity_color(similarity: f64) -> Color {
    if similarity >= 0.90 {
        Color::Green
    } else if similarity >= 0.80 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Renders a scene timestamp in seconds as `minutes:seconds`.
fn format_timestamp(seconds: f64) -> String {
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn adult_label(is_adult: bool) -> StyledContent<&'static str> {
    if is_adult {
        "true".red().bold()
    } else {
        "false".green()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AnilistInfo, AnimeTitle};
    use crossterm::style::Attribute;

    /// Drops `ESC [ ... m` color sequences so assertions see plain text.
    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\u{1b}' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    fn sample_match() -> SceneMatch {
        SceneMatch {
            similarity: 0.987654,
            episode: Some(3),
            from: 60.0,
            to: 75.5,
            anilist: AnilistInfo {
                title: AnimeTitle {
                    native: Some("N".into()),
                    romaji: Some("R".into()),
                    english: Some("E".into()),
                },
                is_adult: false,
            },
        }
    }

    #[test]
    fn formats_timestamps_as_minutes_and_seconds() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(60.0), "1:00");
        assert_eq!(format_timestamp(75.5), "1:15");
        assert_eq!(format_timestamp(3599.9), "59:59");
        assert_eq!(format_timestamp(3600.0), "60:00");
    }

    #[test]
    fn similarity_coloring_is_monotonic() {
        fn rank(color: Color) -> u8 {
            match color {
                Color::Red => 0,
                Color::Yellow => 1,
                Color::Green => 2,
                other => panic!("unexpected similarity color {other:?}"),
            }
        }
        assert_eq!(similarity_color(0.95), Color::Green);
        assert_eq!(similarity_color(0.90), Color::Green);
        assert_eq!(similarity_color(0.85), Color::Yellow);
        assert_eq!(similarity_color(0.80), Color::Yellow);
        assert_eq!(similarity_color(0.50), Color::Red);
        assert!(rank(similarity_color(0.95)) > rank(similarity_color(0.50)));
    }

    #[test]
    fn adult_flag_styles() {
        let adult = adult_label(true);
        assert_eq!(*adult.content(), "true");
        assert_eq!(adult.style().foreground_color, Some(Color::Red));
        assert!(adult.style().attributes.has(Attribute::Bold));

        let safe = adult_label(false);
        assert_eq!(*safe.content(), "false");
        assert_eq!(safe.style().foreground_color, Some(Color::Green));
    }

    #[test]
    fn renders_the_eight_fields_in_order() {
        let mut out = Vec::new();
        render_match(&mut out, &sample_match()).expect("render");
        let text = strip_ansi(&String::from_utf8(out).expect("utf8 output"));

        let fields = [
            "Title Native: N",
            "Title Romaji: R",
            "Title English: E",
            "Similarity: 0.987654",
            "Episode Number: 3",
            "Scene From: 1:00",
            "Scene To: 1:15",
            "Is Adult: false",
        ];
        let mut last = 0;
        for field in fields {
            let at = text[last..]
                .find(field)
                .unwrap_or_else(|| panic!("missing or out-of-order field: {field}"));
            last += at + field.len();
        }
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn renders_absent_episode_as_zero() {
        let mut scene = sample_match();
        scene.episode = None;
        let mut out = Vec::new();
        render_match(&mut out, &scene).expect("render");
        let text = strip_ansi(&String::from_utf8(out).expect("utf8 output"));
        assert!(text.contains("Episode Number: 0"));
    }
}
