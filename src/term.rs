use apio_core::{Header, LineKind, OutputSink, Summary};
use colored::Colorize;

/// Prints tool output to the terminal, highlighted by [`LineKind`].
#[derive(Debug, Default)]
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn stdout_line(&mut self, line: &str) {
        match LineKind::of_stdout(line) {
            LineKind::UpToDate => println!("{}", line.green()),
            _ => println!("{line}"),
        }
    }

    fn stderr_line(&mut self, line: &str) {
        match LineKind::of_stderr(line) {
            LineKind::Error => println!("{}", line.red()),
            _ => println!("{}", line.yellow()),
        }
    }

    fn header(&mut self, header: &Header) {
        println!(
            "[{}] Processing {}",
            header.timestamp,
            header.board.cyan().bold()
        );
        println!("{}", header.rule.bold());
    }

    fn summary(&mut self, summary: &Summary) {
        let status = if summary.success {
            summary.status().green().bold()
        } else {
            summary.status().red().bold()
        };
        let line = format!(
            "{} [{status}]{}{}",
            summary.half_rule, summary.text, summary.half_rule
        );
        if summary.success {
            println!("{line}");
        } else {
            eprintln!("{line}");
        }
    }
}
