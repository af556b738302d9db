//! Lex production source into:
//! - one lexeme per line on stdout
//! - Debug on stderr - the internal representation from the `prodrule` crate.
//!
//! Diagnostics are logged; set `RUST_LOG` to see them.
//!
//! ```ignore
//! <rules.soar lex_to_debug
//! ```

use std::io::{Read, Write};

use prodrule::lexer::{LexemeKind, Lexer};

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let mut input = Vec::new();
    std::io::stdin().lock().read_to_end(&mut input)?;
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();

    let mut lexer = Lexer::new();
    lexer.attach(input);
    loop {
        let lexeme = lexer.next_lexeme();
        writeln!(stdout, "{}", lexeme)?;
        writeln!(stderr, "{:?}", lexeme)?;
        if lexeme.kind == LexemeKind::Eof {
            break;
        }
    }
    for diagnostic in lexer.diagnostics() {
        writeln!(stderr, "{}", diagnostic)?;
    }
    Ok(())
}
