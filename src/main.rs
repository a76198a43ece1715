//! # CodeSnap - Learning Workspace
//!
//! Command-line access to the virtual workspace that backs the CodeSnap
//! practice editor.
//!
//! ## Quick Start
//!
//! ```bash
//! # Show the workspace tree
//! cargo run -- tree
//!
//! # Create a file inside a folder
//! cargo run -- mkdir algorithms
//! cargo run -- new bfs.java --folder <FOLDER-ID>
//!
//! # Create file{N}.java at the root
//! cargo run -- new --language java
//!
//! # Bring a file in from disk, and back out again
//! cargo run -- import path/to/solve.java
//! cargo run -- export <FILE-ID> ./out
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codesnap_core::organizer::FolderNode;
use codesnap_core::{Config, FileId, FolderId, Language, Session, Workspace};

/// CodeSnap - manage the practice editor's workspace
#[derive(Parser, Debug)]
#[command(name = "codesnap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the user config dir)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the workspace snapshot
    #[arg(short, long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the file tree
    Tree,

    /// Print a file's content (defaults to the active file)
    Show { id: Option<String> },

    /// Create a file and make it active
    New {
        /// File name; omit for file{N} with the current language's extension
        name: Option<String>,
        /// Folder to create the file in
        #[arg(short, long)]
        folder: Option<String>,
        /// Language instead of the one implied by the extension
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Create a folder
    Mkdir {
        name: String,
        /// Enclosing folder
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Delete a file
    Rm { id: String },

    /// Delete a folder and everything in it
    Rmdir { id: String },

    /// Rename a file
    Rename { id: String, name: String },

    /// Rename a folder
    RenameFolder { id: String, name: String },

    /// Make a file active
    Open { id: String },

    /// Replace a file's content with stdin (defaults to the active file)
    Write { id: Option<String> },

    /// Reclassify a file's language (defaults to the active file)
    Lang {
        language: Language,
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Import a file from disk into the workspace root
    Import { path: PathBuf },

    /// Export a file into a directory
    Export { id: String, dir: PathBuf },

    /// Discard the workspace and start over
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting CodeSnap v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load(),
    };
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = Some(dir);
    }

    let mut session = Session::open_default(&config)?;
    run(&mut session, args.command).await
}

async fn run(session: &mut Session, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Tree => print!("{}", render_tree(session)),
        Command::Show { id } => {
            let file = match id {
                Some(id) => {
                    let id = resolve_file(session.workspace(), &id)?;
                    session.workspace().file(&id)
                }
                None => session.current_file(),
            };
            if let Some(file) = file {
                println!("{}", file.content);
            }
        }
        Command::New {
            name,
            folder,
            language,
        } => {
            let folder = folder
                .map(|f| resolve_folder(session.workspace(), &f))
                .transpose()?;
            let file = match name {
                Some(name) => session.create_file(name, folder, None, language)?,
                None => {
                    if let Some(language) = language {
                        session.set_language_preference(language);
                    }
                    session.create_untitled_file(folder)?
                }
            };
            println!("{} {} ({})", short(&file.id), file.name, file.language);
        }
        Command::Mkdir { name, parent } => {
            let parent = parent
                .map(|p| resolve_folder(session.workspace(), &p))
                .transpose()?;
            let folder = session.create_folder(name, parent)?;
            println!("{} {}/", short(&folder.id), folder.name);
        }
        Command::Rm { id } => {
            let id = resolve_file(session.workspace(), &id)?;
            session.delete_file(&id)?;
        }
        Command::Rmdir { id } => {
            let id = resolve_folder(session.workspace(), &id)?;
            let removal = session.delete_folder(&id)?;
            println!(
                "Removed {} folders and {} files",
                removal.folders.len(),
                removal.files.len()
            );
        }
        Command::Rename { id, name } => {
            let id = resolve_file(session.workspace(), &id)?;
            session.rename_file(&id, name)?;
        }
        Command::RenameFolder { id, name } => {
            let id = resolve_folder(session.workspace(), &id)?;
            session.rename_folder(&id, name)?;
        }
        Command::Open { id } => {
            let id = resolve_file(session.workspace(), &id)?;
            let file = session.open_file(&id)?;
            println!("{} ({})", file.name, file.language);
        }
        Command::Write { id } => {
            let id = match id {
                Some(id) => resolve_file(session.workspace(), &id)?,
                None => session
                    .current_file()
                    .map(|f| f.id.clone())
                    .context("No active file")?,
            };
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            session.update_file_content(&id, content)?;
        }
        Command::Lang { language, file } => match file {
            Some(file) => {
                let id = resolve_file(session.workspace(), &file)?;
                session.reclassify_file(&id, language)?;
            }
            None => session.set_language(language)?,
        },
        Command::Import { path } => {
            let file = session.import_path(&path).await?;
            println!("{} {} ({})", short(&file.id), file.name, file.language);
        }
        Command::Export { id, dir } => {
            let id = resolve_file(session.workspace(), &id)?;
            if let Some(path) = session.export_to(&id, &dir).await? {
                println!("{}", path.display());
            }
        }
        Command::Reset => session.reset()?,
    }

    Ok(())
}

/// First 8 characters of an id, enough to address it on the command line.
fn short(id: impl ToString) -> String {
    id.to_string().chars().take(8).collect()
}

/// Finds the single id that starts with `prefix`.
///
/// An exact match wins even when it is also a prefix of other ids.
fn resolve_unique<'a, T: Clone + std::fmt::Display + 'a>(
    ids: impl Iterator<Item = &'a T>,
    prefix: &str,
    kind: &str,
) -> anyhow::Result<T> {
    let mut matches: Vec<&T> = ids.filter(|id| id.to_string().starts_with(prefix)).collect();
    if let Some(exact) = matches.iter().find(|id| id.to_string() == prefix) {
        return Ok((*exact).clone());
    }
    match matches.len() {
        1 => Ok(matches.remove(0).clone()),
        0 => bail!("No {kind} matches {prefix:?}"),
        n => bail!("{prefix:?} matches {n} {kind}s, use a longer prefix"),
    }
}

fn resolve_file(workspace: &Workspace, prefix: &str) -> anyhow::Result<FileId> {
    resolve_unique(workspace.files().iter().map(|f| &f.id), prefix, "file")
}

fn resolve_folder(workspace: &Workspace, prefix: &str) -> anyhow::Result<FolderId> {
    resolve_unique(workspace.folders().iter().map(|f| &f.id), prefix, "folder")
}

fn render_tree(session: &Session) -> String {
    let active = session.current_file().map(|f| &f.id);
    let tree = session.organized_files();
    let mut out = format!("{}\n", session.workspace().name());

    let mut entries: Vec<Entry<'_>> = tree.folders.iter().map(Entry::Folder).collect();
    entries.extend(tree.root_files.iter().map(|f| Entry::File(&f.id, &f.name)));
    render_entries(&entries, "", active, &mut out);
    out
}

enum Entry<'a> {
    Folder(&'a FolderNode<'a>),
    File(&'a FileId, &'a str),
}

fn render_entries(entries: &[Entry<'_>], indent: &str, active: Option<&FileId>, out: &mut String) {
    for (i, entry) in entries.iter().enumerate() {
        let last = i + 1 == entries.len();
        let (branch, child_indent) = if last {
            ("└── ", format!("{indent}    "))
        } else {
            ("├── ", format!("{indent}│   "))
        };

        match entry {
            Entry::Folder(node) => {
                out.push_str(&format!(
                    "{indent}{branch}{}/ [{}]\n",
                    node.folder.name,
                    short(&node.folder.id)
                ));
                let mut children: Vec<Entry<'_>> = node.children.iter().map(Entry::Folder).collect();
                children.extend(node.files.iter().map(|f| Entry::File(&f.id, &f.name)));
                render_entries(&children, &child_indent, active, out);
            }
            Entry::File(id, name) => {
                let marker = if Some(*id) == active { " *" } else { "" };
                out.push_str(&format!("{indent}{branch}{name} [{}]{marker}\n", short(id)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesnap_core::{MemoryStorage, Storage};

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["codesnap", "tree"]);
        assert!(args.data_dir.is_none());
        assert!(matches!(args.command, Command::Tree));
    }

    #[test]
    fn test_args_with_language() {
        let args = Args::parse_from(["codesnap", "-v", "new", "a.txt", "--language", "java"]);
        assert_eq!(args.verbose, 1);
        match args.command {
            Command::New { name, language, .. } => {
                assert_eq!(name.as_deref(), Some("a.txt"));
                assert_eq!(language, Some(Language::Java));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_new_without_name() {
        let args = Args::parse_from(["codesnap", "new", "--language", "c"]);
        assert!(matches!(
            args.command,
            Command::New { name: None, language: Some(Language::C), .. }
        ));
    }

    #[tokio::test]
    async fn test_run_new_untitled_uses_language() {
        let mut session = Session::open(&Config::default(), MemoryStorage::new());
        let command = Command::New {
            name: None,
            folder: None,
            language: Some(Language::JavaScript),
        };
        run(&mut session, command).await.unwrap();

        let current = session.current_file().unwrap();
        assert_eq!(current.name, "file2.js");
        assert_eq!(current.language, Language::JavaScript);
    }

    #[test]
    fn test_resolve_exact_legacy_id() {
        let storage = MemoryStorage::new();
        storage
            .set(
                "codesnap_workspace",
                r#"{"name":"W","folders":[],"files":[
                    {"id":"file_1","name":"a.py","content":"","language":"python",
                     "lastModified":"2024-01-01T00:00:00Z","folderId":null},
                    {"id":"file_12","name":"b.py","content":"","language":"python",
                     "lastModified":"2024-01-01T00:00:00Z","folderId":null}],
                   "activeFileId":"file_1"}"#,
            )
            .unwrap();
        let session = Session::open(&Config::default(), storage);

        let id = resolve_file(session.workspace(), "file_1").unwrap();
        assert_eq!(id.as_str(), "file_1");
        assert!(resolve_file(session.workspace(), "file_").is_err());
    }

    #[test]
    fn test_resolve_prefix() {
        let mut session = Session::open(&Config::default(), MemoryStorage::new());
        let file = session.create_file("a.py", None, None, None).unwrap();
        let resolved = resolve_file(session.workspace(), &short(&file.id)).unwrap();
        assert_eq!(resolved, file.id);
        assert!(resolve_folder(session.workspace(), "zzzz").is_err());
    }

    #[test]
    fn test_render_tree_marks_active() {
        let mut session = Session::open(&Config::default(), MemoryStorage::new());
        let folder = session.create_folder("src", None).unwrap();
        session.create_file("lib.c", Some(folder.id), None, None).unwrap();

        let tree = render_tree(&session);
        assert!(tree.starts_with("My Learning Workspace\n"));
        assert!(tree.contains("├── src/"));
        assert!(tree.contains("│   └── lib.c"));
        assert!(tree.contains("lib.c ["));
        assert!(tree.lines().any(|l| l.contains("lib.c") && l.ends_with(" *")));
        assert!(tree.contains("└── welcome.py"));
    }
}
