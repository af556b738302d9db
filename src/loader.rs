//! Loading a single production from source text.
//!
//! The loader owns a [Lexer] and sequences it for a [ProductionParser]:
//! attach the text, read the first lexeme with identifiers disabled (a
//! production's name is never an identifier), let the parser consume the
//! rest, then restore identifier mode and detach, whatever the outcome.

use std::fmt;

use crate::lexer::{Diagnostic, Lexer, LexerOptions};

/// Why a parser did not produce a production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A production with the same name already exists; nothing was added.
    Duplicate,
    /// The production could not be parsed or added.
    Failed(String),
}

/// Parses one production from a lexer positioned at its first lexeme,
/// and adds it to whatever holds the productions.
pub trait ProductionParser {
    type Production: SourceTag;

    fn parse_production(&mut self, lexer: &mut Lexer) -> Result<Self::Production, Rejection>;
}

/// Productions remember which source they were loaded from.
pub trait SourceTag {
    fn set_source_name(&mut self, name: &str);
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoadOutcome<P> {
    Installed(P),
    /// Not an error: the production was already present, and is ignored.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Failed(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Failed(e) if e.is_empty() => write!(f, "Production addition failed."),
            LoadError::Failed(e) => write!(f, "Production addition failed. {e}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl LoadError {
    /// Add additional context to an error.
    pub fn annotate(self, more: impl AsRef<str>) -> Self {
        match self {
            LoadError::Failed(e) if e.is_empty() => LoadError::Failed(more.as_ref().to_owned()),
            LoadError::Failed(e) => LoadError::Failed(format!("{}: {}", more.as_ref(), e)),
        }
    }
}

pub type LoadResult<P> = Result<LoadOutcome<P>, LoadError>;

#[derive(Debug, Default, Clone, Copy)]
pub struct LoaderConfig {
    /// Append a `*` to the output for every production loaded.
    pub raw_output: bool,
    pub lexer: LexerOptions,
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadStats {
    /// Productions added.
    pub sourced: usize,
    /// Duplicate productions skipped.
    pub ignored: usize,
    /// Productions that failed to load.
    pub failed: usize,
}

pub struct ProductionLoader<P: ProductionParser> {
    lexer: Lexer,
    parser: P,
    config: LoaderConfig,
    stats: LoadStats,
    output: String,
}

impl<P: ProductionParser> ProductionLoader<P> {
    pub fn new(parser: P) -> Self {
        Self::with_config(parser, LoaderConfig::default())
    }

    pub fn with_config(parser: P, config: LoaderConfig) -> Self {
        ProductionLoader {
            lexer: Lexer::with_options(config.lexer),
            parser,
            config,
            stats: LoadStats::default(),
            output: String::new(),
        }
    }

    /// Load one production from `text`, tagging it with `source_name` if given.
    pub fn load(
        &mut self,
        text: impl Into<Vec<u8>>,
        source_name: Option<&str>,
    ) -> LoadResult<P::Production> {
        self.lexer.attach(text);
        self.lexer.set_allow_identifiers(false);
        self.lexer.next_lexeme();
        let result = self.parser.parse_production(&mut self.lexer);
        self.lexer.set_allow_identifiers(true);
        self.lexer.detach();

        match result {
            Ok(mut production) => {
                if let Some(name) = source_name {
                    production.set_source_name(name);
                }
                self.stats.sourced += 1;
                if self.config.raw_output {
                    self.output.push('*');
                }
                tracing::debug!("production sourced from {:?}", source_name);
                Ok(LoadOutcome::Installed(production))
            }
            Err(Rejection::Duplicate) => {
                self.stats.ignored += 1;
                tracing::info!("ignoring duplicate production");
                Ok(LoadOutcome::Duplicate)
            }
            Err(Rejection::Failed(reason)) => {
                self.stats.failed += 1;
                let err = LoadError::Failed(reason);
                let err = match source_name {
                    Some(name) => err.annotate(name),
                    None => err,
                };
                tracing::error!("{}", err);
                Err(err)
            }
        }
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    /// Output accumulated since the last [Self::take_output].
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn set_raw_output(&mut self, raw: bool) {
        self.config.raw_output = raw;
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    /// Diagnostics from the most recent load.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.lexer.diagnostics()
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut P {
        &mut self.parser
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::lexer::{LexemeKind, Severity};

    #[derive(Debug, PartialEq)]
    struct Prod {
        name: String,
        name_kind: LexemeKind,
        source: Option<String>,
        body: Vec<LexemeKind>,
        allow_ids: bool,
    }

    impl SourceTag for Prod {
        fn set_source_name(&mut self, name: &str) {
            self.source = Some(name.to_owned());
        }
    }

    /// Reads `name body...` and refuses names it has seen before.
    #[derive(Default)]
    struct NameParser {
        known: HashSet<String>,
    }

    impl ProductionParser for NameParser {
        type Production = Prod;

        fn parse_production(&mut self, lexer: &mut Lexer) -> Result<Prod, Rejection> {
            let first = lexer.lexeme();
            let name_kind = first.kind;
            if !matches!(
                name_kind,
                LexemeKind::StrConstant | LexemeKind::Identifier | LexemeKind::Variable
            ) {
                return Err(Rejection::Failed(format!(
                    "expected a production name, found {}",
                    first
                )));
            }
            let name = first.text_lossy().into_owned();
            let allow_ids = lexer.allow_identifiers();

            let mut body = Vec::new();
            while lexer.next_lexeme().kind != LexemeKind::Eof {
                body.push(lexer.lexeme().kind);
            }
            if lexer.current_paren_depth() != 0 {
                return Err(Rejection::Failed("unbalanced parentheses".to_owned()));
            }
            if !self.known.insert(name.clone()) {
                return Err(Rejection::Duplicate);
            }
            Ok(Prod {
                name,
                name_kind,
                source: None,
                body,
                allow_ids,
            })
        }
    }

    #[test]
    fn installs_and_tags() -> Result<(), String> {
        let mut loader = ProductionLoader::new(NameParser::default());
        let outcome = loader
            .load("first (state <s>) --> (<s> ^done yes)", Some("rules.soar"))
            .map_err(|e| e.to_string())?;
        let LoadOutcome::Installed(prod) = outcome else {
            return Err(format!("unexpected outcome {:?}", outcome));
        };
        assert_eq!(prod.name, "first");
        assert_eq!(prod.source.as_deref(), Some("rules.soar"));
        assert_eq!(prod.body.len(), 11);
        assert!(!prod.allow_ids);

        assert_eq!(
            loader.stats(),
            LoadStats {
                sourced: 1,
                ignored: 0,
                failed: 0
            }
        );
        assert_eq!(loader.output(), "");
        assert!(loader.lexer().allow_identifiers());
        assert_eq!(loader.lexer().lexeme().kind, LexemeKind::Eof);
        Ok(())
    }

    #[test]
    fn names_are_never_identifiers() -> Result<(), String> {
        let mut loader = ProductionLoader::new(NameParser::default());
        let outcome = loader.load("a1 (x)", None).map_err(|e| e.to_string())?;
        match outcome {
            LoadOutcome::Installed(Prod {
                name_kind: LexemeKind::StrConstant,
                source: None,
                ..
            }) => Ok(()),
            _ => Err(format!("unexpected outcome {:?}", outcome)),
        }
    }

    #[test]
    fn duplicates_are_counted() -> Result<(), String> {
        let mut loader = ProductionLoader::with_config(
            NameParser::default(),
            LoaderConfig {
                raw_output: true,
                ..Default::default()
            },
        );
        loader.load("p (a)", None).map_err(|e| e.to_string())?;
        let outcome = loader.load("p (b)", None).map_err(|e| e.to_string())?;
        assert_eq!(outcome, LoadOutcome::Duplicate);
        assert_eq!(
            loader.stats(),
            LoadStats {
                sourced: 1,
                ignored: 1,
                failed: 0
            }
        );
        assert!(loader
            .diagnostics()
            .iter()
            .all(|d| d.severity != Severity::Error));
        assert_eq!(loader.take_output(), "*");
        assert_eq!(loader.output(), "");

        // Forgetting the name in the parser lets the production load again.
        assert!(loader.parser().known.contains("p"));
        loader.parser_mut().known.remove("p");
        let outcome = loader.load("p (c)", None).map_err(|e| e.to_string())?;
        assert!(matches!(outcome, LoadOutcome::Installed(Prod { ref name, .. }) if name == "p"));
        assert_eq!(loader.stats().sourced, 2);
        assert_eq!(loader.parser().known.len(), 1);
        Ok(())
    }

    #[test]
    fn raw_output_marks_each_production() {
        let mut loader = ProductionLoader::new(NameParser::default());
        loader.set_raw_output(true);
        for name in ["one", "two", "three"] {
            assert!(loader.load(name, None).is_ok());
        }
        assert_eq!(loader.output(), "***");
        assert!(loader.config().raw_output);
    }

    #[test]
    fn failures_are_errors() {
        let mut loader = ProductionLoader::new(NameParser::default());
        let err = loader.load("(oops", Some("bad.soar"));
        assert_eq!(
            err,
            Err(LoadError::Failed(
                "bad.soar: expected a production name, found LParen \"(\"".to_owned()
            ))
        );
        let Err(err) = err else { return };
        assert_eq!(
            err.to_string(),
            "Production addition failed. bad.soar: expected a production name, found LParen \"(\""
        );

        let err = loader.load("ok (unbalanced", None);
        assert_eq!(
            err,
            Err(LoadError::Failed("unbalanced parentheses".to_owned()))
        );
        assert_eq!(
            loader.stats(),
            LoadStats {
                sourced: 0,
                ignored: 0,
                failed: 2
            }
        );
        assert!(loader.lexer().allow_identifiers());
    }

    #[test]
    fn unterminated_literal_stops_the_parser() {
        let mut loader = ProductionLoader::new(NameParser::default());
        let outcome = loader.load("p (|abc)", None);
        assert!(outcome.is_err(), "{:?}", outcome);
        let diagnostics = loader.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn empty_reason() {
        assert_eq!(
            LoadError::Failed(String::new()).to_string(),
            "Production addition failed."
        );
        assert_eq!(
            LoadError::Failed(String::new()).annotate("x.soar"),
            LoadError::Failed("x.soar".to_owned())
        );
    }
}
