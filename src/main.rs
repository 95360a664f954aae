use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use leerpad::{MiniGame, PlaceholderGame, PlatformError, Session, Store};

/// Terminal shell around the platform library: student skill tree, the
/// manual-score placeholder widget, and the teacher dashboard.
#[derive(Parser)]
#[command(name = "leerpad", version, about = "Skill-tree learning platform for physics mini-games")]
struct Args {
    /// Directory for the local progress store (defaults to ~/.leerpad)
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let root = args
        .store_dir
        .or_else(Store::default_root)
        .context("cannot determine a home directory; pass --store-dir")?;
    let store = Store::open(root)?;
    let mut session = Session::new(store)?;

    loop {
        if session.identity().is_none() {
            if !login_menu(&mut session)? {
                break;
            }
        } else if session.student().is_some() {
            student_menu(&mut session)?;
        } else {
            teacher_menu(&mut session)?;
        }
    }
    Ok(())
}

/// Read one trimmed line, or `None` on EOF.
fn prompt(label: &str) -> anyhow::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Returns false when the user wants to quit.
fn login_menu(session: &mut Session) -> anyhow::Result<bool> {
    println!("\n=== Leerpad ===");
    println!("  1) log in as student");
    println!("  2) log in as teacher");
    println!("  q) quit");

    let Some(choice) = prompt("> ")? else {
        return Ok(false);
    };
    match choice.as_str() {
        "1" => {
            let Some(name) = prompt("Name: ")? else { return Ok(false) };
            let Some(class) = prompt("Class: ")? else { return Ok(false) };
            match session.login_student(&name, &class) {
                Ok(data) => println!("Welcome, {}!", data.name),
                Err(err) => println!("{err}"),
            }
        }
        "2" => {
            let Some(password) = prompt("Password: ")? else { return Ok(false) };
            match session.login_teacher(&password) {
                Ok(()) => println!("Teacher dashboard unlocked."),
                Err(err) => println!("{err}"),
            }
        }
        "q" | "" => return Ok(false),
        other => println!("Unknown choice '{other}'."),
    }
    Ok(true)
}

fn student_menu(session: &mut Session) -> anyhow::Result<()> {
    print_tree(session);
    println!("Enter a game number to play, or 'q' to log out.");

    let Some(choice) = prompt("> ")? else {
        session.logout();
        return Ok(());
    };
    if choice.eq_ignore_ascii_case("q") {
        session.logout();
        return Ok(());
    }
    let Ok(id) = choice.parse() else {
        println!("Unknown choice '{choice}'.");
        return Ok(());
    };

    let node = match session.open_game(id) {
        Ok(node) => node,
        Err(PlatformError::Locked(_)) => {
            println!("That game is still locked. Pass the games leading to it first.");
            return Ok(());
        }
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };
    println!("\n--- {} (minimum score {}) ---", node.name, node.min_score);

    let mut game = PlaceholderGame::new(io::stdin().lock(), io::stdout());
    let signal = game.run()?;
    match session.handle_signal(signal)? {
        Some(eval) if eval.passed => {
            let score = session
                .student()
                .and_then(|s| s.scores.get(&id).copied())
                .unwrap_or(0);
            println!("Passed with {score}!");
            for unlocked in &eval.newly_unlocked {
                if let Ok(next) = session.catalog().get(*unlocked) {
                    println!("Unlocked: {}", next.name);
                }
            }
        }
        Some(eval) => {
            println!("Not quite: you need at least {}. Try again!", eval.min_score);
        }
        None => println!("Game closed."),
    }
    Ok(())
}

fn print_tree(session: &Session) {
    let Some(student) = session.student() else { return };
    let completed = student.completed_count();
    let total = session.catalog().len();

    println!("\n{} ({}), {}/{} games completed", student.name, student.class, completed, total);
    for (id, node) in session.catalog().iter() {
        let unlocked = student.progress.get(&id).is_some_and(|p| p.unlocked);
        let line = match student.scores.get(&id) {
            Some(score) => format!("[*] {id}. {:<24} score {score} (min {})", node.name, node.min_score),
            None if unlocked => format!("[ ] {id}. {:<24} open (min {})", node.name, node.min_score),
            None => format!("[x] {id}. {:<24} locked", node.name),
        };
        println!("  {line}");
    }
}

fn teacher_menu(session: &mut Session) -> anyhow::Result<()> {
    println!("\n=== Teacher dashboard ===");
    match session.dashboard() {
        Ok(rows) if rows.is_empty() => println!("No students yet."),
        Ok(rows) => {
            println!("{:<20} {:<8} {:<12} last active", "name", "class", "progress");
            for row in rows {
                println!(
                    "{:<20} {:<8} {:<12} {}",
                    row.name,
                    row.class,
                    format!("{}/{} ({}%)", row.completed, row.total, row.percent),
                    row.last_active.format("%Y-%m-%d")
                );
            }
        }
        Err(err) => println!("{err}"),
    }

    println!("\n  p) change teacher password");
    println!("  q) log out");
    let Some(choice) = prompt("> ")? else {
        session.logout();
        return Ok(());
    };
    match choice.as_str() {
        "p" => {
            let Some(password) = prompt("New password: ")? else { return Ok(()) };
            match session.set_teacher_password(&password) {
                Ok(()) => println!("Password updated."),
                Err(err) => println!("{err}"),
            }
        }
        "q" => session.logout(),
        other => println!("Unknown choice '{other}'."),
    }
    Ok(())
}
