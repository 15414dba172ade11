use colored::Colorize;

fn main() {
    if let Err(err) = quartermaster::run() {
        eprintln!("{} {}", "[ FAILED ]".bright_red().bold(), err);
        std::process::exit(1);
    }
}
