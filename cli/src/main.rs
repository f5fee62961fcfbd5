mod logging;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use argh::FromArgs;
use piecetree_buffer::{Document, EolPolicy, SearchOptions};

/// drive the piece-tree buffer core from a line-oriented command
/// prompt: load a file, issue edit/search/undo commands, write it back.
#[derive(FromArgs)]
struct Cli {
    /// file to open; an empty in-memory document is used if omitted
    #[argh(positional)]
    file: Option<PathBuf>,

    /// turn debugging information on
    #[argh(switch)]
    debug: bool,

    /// set log file location
    #[argh(option)]
    log_file: Option<PathBuf>,
}

fn main() {
    let cli: Cli = argh::from_env();

    let log_file = cli
        .log_file
        .unwrap_or_else(|| std::env::temp_dir().join("ptedit.log"));
    logging::init_panic_hook();
    logging::init_logger(&log_file, cli.debug);

    let mut doc = match &cli.file {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => {
                log::info!("loaded {} ({} bytes)", path.display(), text.len());
                Document::init_from_string(&text, EolPolicy::None)
            }
            Err(e) => {
                log::error!("could not read {}: {e}", path.display());
                Document::new()
            }
        },
        None => Document::new(),
    };

    println!("ptedit: type `help` for commands, `quit` to exit");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        match run_command(&mut doc, &line, cli.file.as_deref()) {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => println!("error: {e}"),
        }
        let _ = io::stdout().flush();
    }
}

/// Dispatch one command line. Returns `Ok(true)` when the REPL should
/// exit.
fn run_command(doc: &mut Document, line: &str, path: Option<&std::path::Path>) -> Result<bool, String> {
    let mut parts = line.trim().splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").to_string();

    match cmd {
        "" => {}
        "help" => print_help(),
        "quit" | "exit" => return Ok(true),
        "print" => println!("{}", doc.text()),
        "length" => println!("{}", doc.length()),
        "lines" => println!("{}", doc.line_count()),
        "insert" => {
            let mut args = rest.splitn(2, ' ');
            let offset: u64 = args
                .next()
                .ok_or("usage: insert <offset> <text>")?
                .parse()
                .map_err(|_| "offset must be a number")?;
            let text = args.next().unwrap_or("");
            doc.insert(offset, text).map_err(|e| e.to_string())?;
            log::debug!("insert at {offset}: {text:?}");
        }
        "delete" => {
            let mut args = rest.split(' ');
            let start: u64 = args
                .next()
                .ok_or("usage: delete <start> <end>")?
                .parse()
                .map_err(|_| "start must be a number")?;
            let end: u64 = args
                .next()
                .ok_or("usage: delete <start> <end>")?
                .parse()
                .map_err(|_| "end must be a number")?;
            doc.delete(start, end).map_err(|e| e.to_string())?;
            log::debug!("delete [{start},{end})");
        }
        "replace" => {
            let mut args = rest.splitn(3, ' ');
            let start: u64 = args
                .next()
                .ok_or("usage: replace <start> <end> <text>")?
                .parse()
                .map_err(|_| "start must be a number")?;
            let end: u64 = args
                .next()
                .ok_or("usage: replace <start> <end> <text>")?
                .parse()
                .map_err(|_| "end must be a number")?;
            let text = args.next().unwrap_or("");
            doc.replace(start, end, text).map_err(|e| e.to_string())?;
        }
        "find" => {
            let opts = SearchOptions {
                case_sensitive: true,
                ..Default::default()
            };
            let matches = doc.find_all(&rest, 0, &opts, 1_000).map_err(|e| e.to_string())?;
            for m in &matches {
                println!("{}..{}", m.start, m.end);
            }
            println!("{} match(es)", matches.len());
        }
        "undo" => match doc.undo().map_err(|e| e.to_string())? {
            Some(offset) => println!("undone, cursor at {offset}"),
            None => println!("nothing to undo"),
        },
        "redo" => match doc.redo().map_err(|e| e.to_string())? {
            Some(offset) => println!("redone, cursor at {offset}"),
            None => println!("nothing to redo"),
        },
        "save" => {
            let target = path.ok_or("no file was opened")?;
            fs::write(target, doc.text()).map_err(|e| e.to_string())?;
            log::info!("saved {}", target.display());
            println!("saved {}", target.display());
        }
        other => println!("unknown command: {other} (try `help`)"),
    }
    Ok(false)
}

fn print_help() {
    println!(
        "commands:\n\
         \u{20}  insert <offset> <text>\n\
         \u{20}  delete <start> <end>\n\
         \u{20}  replace <start> <end> <text>\n\
         \u{20}  find <query>\n\
         \u{20}  undo / redo\n\
         \u{20}  print / length / lines\n\
         \u{20}  save\n\
         \u{20}  quit"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_print_round_trip() {
        let mut doc = Document::new();
        run_command(&mut doc, "insert 0 hello", None).unwrap();
        assert_eq!(doc.text(), "hello");
    }

    #[test]
    fn delete_then_undo_restores_content() {
        let mut doc = Document::init_from_string("hello world", EolPolicy::None);
        run_command(&mut doc, "delete 5 11", None).unwrap();
        assert_eq!(doc.text(), "hello");
        run_command(&mut doc, "undo", None).unwrap();
        assert_eq!(doc.text(), "hello world");
    }

    #[test]
    fn find_reports_matches() {
        let mut doc = Document::init_from_string("cat cat", EolPolicy::None);
        assert!(run_command(&mut doc, "find cat", None).is_ok());
    }

    #[test]
    fn quit_signals_exit() {
        let mut doc = Document::new();
        assert!(run_command(&mut doc, "quit", None).unwrap());
    }
}
