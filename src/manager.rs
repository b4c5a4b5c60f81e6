use crate::context::STREAM_POSITION;
use crate::import::{load_rule_source, RuleSource};
use crate::source::{parse_statements, Statement, StatementBody};
use crate::test_expr::{self, TestExpr, TokenTestExtractor};
use crate::{
    coord, frame, parse_expr, phrase, Capability, Context, Extractor, ExtractorInfo, ExtractError,
    ITokenSequence, IoError, LoadError, Log, Manager, Match, MatchStream, Namespace, ParseError,
    ScopeId,
};
use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

#[cfg(test)]
mod __tests__;

impl Namespace {
    fn new(name: &str, parent: Option<ScopeId>, source: Option<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: HashMap::new(),
            extractors: HashMap::new(),
            source,
        }
    }
}

impl ExtractorInfo {
    pub(crate) fn new(
        name: &str,
        qualified: String,
        scope: ScopeId,
        bindings: Vec<(String, String)>,
    ) -> Self {
        Self {
            name: name.to_string(),
            qualified,
            scope,
            bindings,
            log: OnceCell::new(),
        }
    }
}

impl Extractor {
    pub(crate) fn info(&self) -> &ExtractorInfo {
        match self {
            Extractor::TokenTest(e) => &e.info,
            Extractor::Phrase(e) => &e.info,
            Extractor::Lexicon(e) => &e.info,
            Extractor::Parse(e) => &e.info,
            Extractor::Coord(e) => &e.info,
            Extractor::Frame(e) => &e.info,
        }
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Extractor::TokenTest(_) => "token test",
            Extractor::Phrase(_) => "phrase",
            Extractor::Lexicon(_) => "phrase lexicon",
            Extractor::Parse(_) => "parse expression",
            Extractor::Coord(_) => "coordinator",
            Extractor::Frame(_) => "frame",
        }
    }

    /// Set a log label to debug this extractor based on the level of [Log].
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.info()
            .log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }
}

impl Display for Extractor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Extractor::TokenTest(e) => write!(f, "{}", e),
            Extractor::Phrase(e) => write!(f, "{}", e),
            Extractor::Lexicon(e) => write!(f, "{}", e),
            Extractor::Parse(e) => write!(f, "{}", e),
            Extractor::Coord(e) => write!(f, "{}", e),
            Extractor::Frame(e) => write!(f, "{}", e),
        }
    }
}

impl Manager {
    /// Create a manager whose root namespace holds the built-in rules `START`, `END`, `ANY`
    /// and `ROOT`.
    pub fn new() -> Self {
        let mut manager = Self {
            scopes: vec![Namespace::new("", None, None)],
            root: ScopeId(0),
            data_dir: None,
            loading: Vec::new(),
        };
        manager.register_builtin("START", TestExpr::Start);
        manager.register_builtin("END", TestExpr::End);
        manager.register_builtin("ANY", TestExpr::Any);
        manager.register_builtin(
            "ROOT",
            TestExpr::Membership {
                items: vec!["root".to_string()],
                ci: true,
            },
        );
        manager
    }

    /// Override the built-in data directory consulted last in the import lookup chain.
    pub fn with_data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn register_builtin(&mut self, name: &str, expr: TestExpr) {
        let info = ExtractorInfo::new(name, name.to_string(), self.root, Vec::new());
        let extractor = Extractor::TokenTest(TokenTestExtractor::new(info, expr));
        self.scopes[self.root.0]
            .extractors
            .insert(name.to_string(), Arc::new(extractor));
    }

    /// Load rules from a file into the root namespace.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            LoadError::Io(IoError::new(path.display().to_string(), err.to_string()))
        })?;
        let statements =
            parse_statements(&content, Some(&path.display().to_string()))?;
        let dir = path.parent().map(Path::to_path_buf);
        self.load_statements(statements, self.root, dir, None)
    }

    /// Load rules from a string into the root namespace.
    pub fn parse_string(&mut self, text: &str) -> Result<(), LoadError> {
        let statements = parse_statements(text, None)?;
        self.load_statements(statements, self.root, None, None)
    }

    fn load_statements(
        &mut self,
        statements: Vec<Statement>,
        scope: ScopeId,
        dir: Option<PathBuf>,
        file: Option<&str>,
    ) -> Result<(), LoadError> {
        for statement in statements {
            self.register_statement(statement, scope, dir.as_deref(), file)?;
        }
        Ok(())
    }

    fn qualify(&self, scope: ScopeId, name: &str) -> String {
        let mut parts = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let ns = &self.scopes[id.0];
            if !ns.name.is_empty() {
                parts.push(ns.name.clone());
            }
            current = ns.parent;
        }
        parts.reverse();
        parts.push(name.to_string());
        parts.join(".")
    }

    fn register(&mut self, scope: ScopeId, name: &str, extractor: Extractor) {
        // Re-binding a name overwrites the previous extractor.
        self.scopes[scope.0]
            .extractors
            .insert(name.to_string(), Arc::new(extractor));
    }

    fn register_statement(
        &mut self,
        statement: Statement,
        scope: ScopeId,
        dir: Option<&Path>,
        file: Option<&str>,
    ) -> Result<(), LoadError> {
        let Statement {
            name,
            bindings,
            body,
            line,
        } = statement;
        let qualified = self.qualify(scope, &name);
        let info = ExtractorInfo::new(&name, qualified, scope, bindings);
        match body {
            StatementBody::TokenTest { expr } => {
                self.load_test_lexicons(&expr, dir)?;
                self.register(
                    scope,
                    &name,
                    Extractor::TokenTest(TokenTestExtractor::new(info, expr)),
                );
            }
            StatementBody::Phrase { ci, expr } => {
                self.register(
                    scope,
                    &name,
                    Extractor::Phrase(phrase::PhraseExtractor::new(info, ci, expr)),
                );
            }
            StatementBody::Lexicon { ci, path } => {
                let source = load_rule_source(&path, dir, self.data_dir.as_deref())
                    .map_err(LoadError::Io)?;
                let lines: Vec<&str> = source.content().lines().collect();
                let expr = phrase::lexicon_expr(&lines).map_err(|message| {
                    LoadError::Parse(ParseError::new(
                        file.map(str::to_string),
                        line,
                        message,
                    ))
                })?;
                self.register(
                    scope,
                    &name,
                    Extractor::Lexicon(phrase::LexiconExtractor::new(info, ci, path, expr)),
                );
            }
            StatementBody::ImportFile { path } => {
                let source = load_rule_source(&path, dir, self.data_dir.as_deref())
                    .map_err(LoadError::Io)?;
                if let RuleSource::File { path: loaded, .. } = &source {
                    let canonical = loaded.canonicalize().unwrap_or_else(|_| loaded.clone());
                    if self.loading.contains(&canonical) {
                        return Err(LoadError::Io(IoError::new(
                            loaded.display().to_string(),
                            "circular import".to_string(),
                        )));
                    }
                    self.loading.push(canonical);
                }
                let imported_file = source.file_name();
                let statements = parse_statements(source.content(), Some(&imported_file))?;
                let child = self.child_scope(scope, &name, source.directory());
                let loaded = self.load_statements(
                    statements,
                    child,
                    source.directory(),
                    Some(&imported_file),
                );
                if let RuleSource::File { .. } = &source {
                    self.loading.pop();
                }
                loaded?;
            }
            StatementBody::ImportBlock { statements } => {
                let child = self.child_scope(scope, &name, None);
                self.load_statements(
                    statements,
                    child,
                    dir.map(Path::to_path_buf),
                    file,
                )?;
            }
            StatementBody::Parse { expr } => {
                self.register(
                    scope,
                    &name,
                    Extractor::Parse(parse_expr::ParseExtractor::new(info, expr)),
                );
            }
            StatementBody::Coord { expr } => {
                self.register(
                    scope,
                    &name,
                    Extractor::Coord(coord::CoordExtractor::new(info, expr)),
                );
            }
            StatementBody::Frame { spec } => {
                self.register(
                    scope,
                    &name,
                    Extractor::Frame(frame::FrameExtractor::new(info, spec)),
                );
            }
        }
        Ok(())
    }

    fn child_scope(&mut self, parent: ScopeId, name: &str, source: Option<PathBuf>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Namespace::new(name, Some(parent), source));
        self.scopes[parent.0].children.insert(name.to_string(), id);
        id
    }

    /// Load lexicon-file leaves of a token test eagerly, so missing files surface at load.
    fn load_test_lexicons(&self, expr: &TestExpr, dir: Option<&Path>) -> Result<(), LoadError> {
        match expr {
            TestExpr::Lexicon { path, ci, items } => {
                let source = load_rule_source(path, dir, self.data_dir.as_deref())
                    .map_err(LoadError::Io)?;
                let mut set = HashSet::new();
                for item in source.content().lines() {
                    let item = item.trim();
                    if item.is_empty() {
                        continue;
                    }
                    set.insert(if *ci {
                        item.to_lowercase()
                    } else {
                        item.to_string()
                    });
                }
                let _ = items.set(set);
                Ok(())
            }
            TestExpr::Not(inner) => self.load_test_lexicons(inner, dir),
            TestExpr::And(members) | TestExpr::Or(members) => {
                for member in members {
                    self.load_test_lexicons(member, dir)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Resolve a (possibly dotted) reference from a scope, climbing toward the root.
    pub(crate) fn lookup_scoped(
        &self,
        reference: &str,
        scope: ScopeId,
    ) -> Result<Arc<Extractor>, ExtractError> {
        let components: Vec<&str> = reference.split('.').collect();
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(found) = self.descend(id, &components) {
                return Ok(found);
            }
            current = self.scopes[id.0].parent;
        }
        Err(ExtractError::UnresolvedName(reference.to_string()))
    }

    fn descend(&self, from: ScopeId, components: &[&str]) -> Option<Arc<Extractor>> {
        let mut ns = from;
        for (index, component) in components.iter().enumerate() {
            let last = index + 1 == components.len();
            if last {
                return self.scopes[ns.0].extractors.get(*component).cloned();
            }
            ns = *self.scopes[ns.0].children.get(*component)?;
        }
        None
    }

    /// Look up a fully-qualified or root-level name without an execution context.
    pub fn lookup(&self, name: &str) -> Option<Arc<Extractor>> {
        self.lookup_scoped(name, self.root).ok()
    }

    /// Names registered in the root namespace, sorted.
    pub fn extractor_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scopes[self.root.0].extractors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Assign a debug log label to a named extractor.
    pub fn set_log(&self, name: &str, log: Log<&'static str>) -> Result<(), String> {
        match self.lookup(name) {
            Some(extractor) => extractor.set_log(log),
            None => Err(format!("'{}' is not a registered rule.", name)),
        }
    }

    /// Apply a named extractor to a token sequence: the primary entry point.
    pub fn apply<'s>(
        &self,
        name: &str,
        seq: &'s dyn ITokenSequence,
    ) -> Result<MatchStream<'s>, ExtractError> {
        let resolved = self.lookup_scoped(name, self.root)?;
        let mut ctx = Context::new();
        let matches = self.stream(&resolved, seq, &mut ctx)?;
        Ok(MatchStream::new(matches))
    }

    /// Apply a named frame extractor; any other rule kind is a type error.
    pub fn frames<'s>(
        &self,
        name: &str,
        seq: &'s dyn ITokenSequence,
    ) -> Result<MatchStream<'s>, ExtractError> {
        let resolved = self.lookup_scoped(name, self.root)?;
        if !matches!(&*resolved, Extractor::Frame(_)) {
            return Err(ExtractError::Type {
                name: name.to_string(),
                expected: "frame",
                found: resolved.kind_name(),
            });
        }
        let mut ctx = Context::new();
        let matches = self.stream(&resolved, seq, &mut ctx)?;
        Ok(MatchStream::new(matches))
    }

    /// Full match stream of an extractor, honoring its binding qualifier and guarding
    /// against stream-level reference cycles.
    pub(crate) fn stream<'s>(
        &self,
        extractor: &Arc<Extractor>,
        seq: &'s dyn ITokenSequence,
        ctx: &mut Context,
    ) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
        let info = extractor.info();
        if !ctx.enter(&info.qualified, STREAM_POSITION) {
            return Err(ExtractError::Recursion {
                name: info.qualified.clone(),
                position: 0,
            });
        }
        ctx.push_bindings(&info.bindings);
        let result = match &**extractor {
            Extractor::TokenTest(test) => test_expr::test_stream(self, test, seq, ctx),
            Extractor::Phrase(px) => {
                phrase::phrase_stream(self, px.nfa(), px.info.scope, seq, ctx)
            }
            Extractor::Lexicon(lx) => {
                phrase::phrase_stream(self, lx.nfa(), lx.info.scope, seq, ctx)
            }
            Extractor::Parse(px) => parse_expr::parse_stream(self, px, seq, ctx),
            Extractor::Coord(cx) => coord::coord_stream(self, cx, seq, ctx),
            Extractor::Frame(fx) => frame::frame_stream(self, fx, seq, ctx),
        };
        ctx.pop_bindings();
        ctx.leave(&info.qualified, STREAM_POSITION);
        if let (Ok(matches), Some(log)) = (&result, info.log.get()) {
            log.log_stream(matches.len());
        }
        result
    }

    /// Matches of an extractor anchored at one token position, used by phrase reference
    /// transitions. Token tests yield at most one single-token match; phrases and lexicons
    /// yield their longest anchored match.
    pub(crate) fn matches_at<'s>(
        &self,
        extractor: &Arc<Extractor>,
        seq: &'s dyn ITokenSequence,
        pos: usize,
        ctx: &mut Context,
    ) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
        let info = extractor.info();
        if !ctx.enter(&info.qualified, pos) {
            return Err(ExtractError::Recursion {
                name: info.qualified.clone(),
                position: pos,
            });
        }
        ctx.push_bindings(&info.bindings);
        let result = self.matches_at_inner(extractor, seq, pos, ctx);
        ctx.pop_bindings();
        ctx.leave(&info.qualified, pos);
        result
    }

    fn matches_at_inner<'s>(
        &self,
        extractor: &Arc<Extractor>,
        seq: &'s dyn ITokenSequence,
        pos: usize,
        ctx: &mut Context,
    ) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
        match &**extractor {
            Extractor::TokenTest(test) => match &test.expr {
                TestExpr::Start => Ok(if pos == 0 {
                    vec![Rc::new(Match::phrase(seq, 0, 0))]
                } else {
                    Vec::new()
                }),
                TestExpr::End => Ok(if pos == seq.length() {
                    vec![Rc::new(Match::phrase(seq, pos, pos))]
                } else {
                    Vec::new()
                }),
                expr => {
                    if pos >= seq.length() {
                        return Ok(Vec::new());
                    }
                    let target = test_expr::TestTarget::Token { seq, index: pos };
                    if test_expr::evaluate(self, expr, &target, test.info.scope, ctx)? {
                        Ok(vec![Rc::new(Match::phrase(seq, pos, pos + 1))])
                    } else {
                        Ok(Vec::new())
                    }
                }
            },
            Extractor::Phrase(px) => {
                match phrase::longest_at(self, px.nfa(), px.info.scope, seq, pos, ctx)? {
                    Some((end, subs)) => {
                        let mut m = Match::phrase(seq, pos, end);
                        m.submatches = subs;
                        Ok(vec![Rc::new(m)])
                    }
                    None => Ok(Vec::new()),
                }
            }
            Extractor::Lexicon(lx) => {
                match phrase::longest_at(self, lx.nfa(), lx.info.scope, seq, pos, ctx)? {
                    Some((end, subs)) => {
                        let mut m = Match::phrase(seq, pos, end);
                        m.submatches = subs;
                        Ok(vec![Rc::new(m)])
                    }
                    None => Ok(Vec::new()),
                }
            }
            other => Err(ExtractError::Type {
                name: other.info().qualified.clone(),
                expected: "token test, phrase or phrase lexicon",
                found: other.kind_name(),
            }),
        }
    }

    /// Arc matches of a parse extractor anchored at one node, used by parse reference
    /// transitions.
    pub(crate) fn parse_matches_from<'s>(
        &self,
        extractor: &Arc<Extractor>,
        seq: &'s dyn ITokenSequence,
        node: usize,
        ctx: &mut Context,
    ) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
        let info = extractor.info();
        if !ctx.enter(&info.qualified, node) {
            return Err(ExtractError::Recursion {
                name: info.qualified.clone(),
                position: node,
            });
        }
        ctx.push_bindings(&info.bindings);
        let result = match &**extractor {
            Extractor::Parse(px) => parse_expr::parse_matches_at(self, px, seq, node, ctx),
            other => Err(ExtractError::Type {
                name: other.info().qualified.clone(),
                expected: "parse expression",
                found: other.kind_name(),
            }),
        };
        ctx.pop_bindings();
        ctx.leave(&info.qualified, node);
        result
    }

    /// Union of the NLP layers a rule and its transitive references need on an input
    /// sequence.
    pub fn requirements(&self, name: &str) -> Result<HashSet<Capability>, ExtractError> {
        let resolved = self.lookup_scoped(name, self.root)?;
        let mut caps = HashSet::new();
        let mut visited = HashSet::new();
        self.gather_requirements(&resolved, &mut visited, &mut caps)?;
        Ok(caps)
    }

    fn gather_requirements(
        &self,
        extractor: &Arc<Extractor>,
        visited: &mut HashSet<String>,
        caps: &mut HashSet<Capability>,
    ) -> Result<(), ExtractError> {
        let info = extractor.info();
        // At a cycle the partial set gathered so far is complete enough: a cycle cannot
        // introduce new requirements.
        if !visited.insert(info.qualified.clone()) {
            return Ok(());
        }
        let mut hard = Vec::new();
        let mut soft = Vec::new();
        match &**extractor {
            Extractor::TokenTest(test) => {
                test.expr.collect_caps(caps);
                test.expr.collect_refs(&mut hard);
            }
            Extractor::Phrase(px) => px.expr.collect_refs(&mut hard),
            Extractor::Lexicon(_) => {}
            Extractor::Parse(px) => {
                caps.insert(Capability::DependencyParse);
                px.expr.collect_refs(&mut hard);
            }
            Extractor::Coord(cx) => cx.expr.collect_refs(&mut hard, &mut soft),
            Extractor::Frame(fx) => {
                hard.push(fx.spec.anchor.clone());
                for (_, path) in &fx.spec.fields {
                    soft.extend(path.iter().cloned());
                }
            }
        }
        for reference in hard {
            let resolved = self.lookup_scoped(&reference, info.scope)?;
            self.gather_requirements(&resolved, visited, caps)?;
        }
        // Select patterns and frame paths may name frame fields rather than rules.
        for reference in soft {
            if let Ok(resolved) = self.lookup_scoped(&reference, info.scope) {
                self.gather_requirements(&resolved, visited, caps)?;
            }
        }
        Ok(())
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
