//! Tokenizer driver: turns raw tokens into annotated tokens.
//!
//! The driver scans the raw token stream left to right. At every position it
//! tries the three lexical matchers — disambiguated id (`Type.id` /
//! `Type.id()`), function call (`name(`), related object id (structured
//! pattern or bare name) — and takes the match consuming the most raw
//! tokens. Positions no matcher claims pass through one token at a time as
//! numbers and operators.
//!
//! Matcher failures do not stop the scan: every error is collected and the
//! scan resumes after the failed run, so a single parse reports each
//! independent problem in the expression once.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::model::{CaseMatching, EntityId, EntityKind, ExprContext, ObjectNamespace};

use super::error::{ParseError, ParseErrors};
use super::lexer::{self, RawKind, RawToken};
use super::token::ExprToken;

/// Byte span into the stripped expression text
type Span = (usize, usize);

/// `Type.identifier()` — disambiguated reference to a callable
const CALL_DISAMBIG_PATTERN: [RawKind; 5] = [
    RawKind::Name,
    RawKind::Dot,
    RawKind::Name,
    RawKind::LParen,
    RawKind::RParen,
];

/// `Type.identifier` — disambiguated reference to a plain model object
const MODEL_DISAMBIG_PATTERN: [RawKind; 3] = [RawKind::Name, RawKind::Dot, RawKind::Name];

/// `name(` — math-function call
const FUNCTION_PATTERN: [RawKind; 2] = [RawKind::Name, RawKind::LParen];

/// A successful lexical match: the annotated tokens it produced and the
/// number of raw tokens it consumed
struct LexMatch {
    consumed: usize,
    tokens: Vec<(ExprToken, Span)>,
}

/// Outcome of one matcher at one position
enum MatchOutcome {
    Match(LexMatch),
    /// The matcher recognized this position but could not resolve it; the
    /// driver records the error and skips the recognized run
    Error { error: ParseError, consumed: usize },
    NoMatch,
}

/// One parse's state: the context metadata, the raw tokens, and the
/// namespace, with the matching policy captured once
struct Tokenizer<'a> {
    context: &'a ExprContext,
    expr: &'a str,
    raw: &'a [RawToken<'a>],
    objects: &'a mut ObjectNamespace,
    matching: CaseMatching,
}

/// The validated result of parsing one expression.
///
/// Immutable once produced; re-derivable at any time by re-parsing the
/// stored expression text against the (possibly updated) namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    context: String,
    expression: String,
    tokens: Vec<ExprToken>,
    spans: Vec<Span>,
    referenced: IndexMap<EntityKind, IndexMap<SmolStr, EntityId>>,
}

impl ParsedExpression {
    /// Name of the owning entity type the expression was parsed for
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The stripped expression text
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn tokens(&self) -> &[ExprToken] {
        &self.tokens
    }

    /// Referenced objects grouped by kind, deduplicated, in first-use order
    /// within each kind; kinds appear in namespace declaration order
    pub fn referenced(&self) -> &IndexMap<EntityKind, IndexMap<SmolStr, EntityId>> {
        &self.referenced
    }

    /// Identifiers of one kind the expression references, in first-use order
    pub fn referenced_ids(&self, kind: EntityKind) -> impl Iterator<Item = &str> + '_ {
        self.referenced
            .get(&kind)
            .into_iter()
            .flat_map(IndexMap::keys)
            .map(SmolStr::as_str)
    }

    /// Re-serialize the token sequence: the stripped source text with runs
    /// of whitespace collapsed to single spaces
    pub fn reconstruct(&self) -> String {
        let mut out = String::with_capacity(self.expression.len());
        let mut prev_end: Option<usize> = None;
        for &(start, end) in &self.spans {
            if let Some(prev) = prev_end
                && start > prev
            {
                out.push(' ');
            }
            out.push_str(&self.expression[start..end]);
            prev_end = Some(end);
        }
        out
    }
}

/// Parse an expression for an owning entity type against a namespace.
///
/// The namespace is read-only except for the idempotent synthesis of
/// composite species identifiers (`type[compartment]`). On failure every
/// problem found in one pass is returned together.
pub fn parse_expression(
    context: &ExprContext,
    text: &str,
    objects: &mut ObjectNamespace,
    matching: CaseMatching,
) -> Result<ParsedExpression, ParseErrors> {
    let expression = text.trim().to_string();
    let raw = lexer::lex(&expression).map_err(ParseErrors::new)?;
    let tokenizer = Tokenizer {
        context,
        expr: &expression,
        raw: &raw,
        objects,
        matching,
    };
    let (tokens, spans, referenced) = tokenizer.run()?;
    Ok(ParsedExpression {
        context: context.name.to_string(),
        expression,
        tokens,
        spans,
        referenced,
    })
}

type DriverOutput = (
    Vec<ExprToken>,
    Vec<Span>,
    IndexMap<EntityKind, IndexMap<SmolStr, EntityId>>,
);

impl<'a> Tokenizer<'a> {
    // ============================================================
    // Driver
    // ============================================================

    fn run(mut self) -> Result<DriverOutput, ParseErrors> {
        let mut tokens: Vec<ExprToken> = Vec::new();
        let mut spans: Vec<Span> = Vec::new();
        let mut referenced: IndexMap<EntityKind, IndexMap<SmolStr, EntityId>> = IndexMap::new();
        let mut errors: Vec<ParseError> = Vec::new();

        let mut idx = 0;
        while idx < self.raw.len() {
            let outcomes = [
                self.disambiguated_id(idx),
                self.function_call(idx),
                self.related_object_id(idx),
            ];

            let mut best: Option<LexMatch> = None;
            let mut failed: Vec<(ParseError, usize)> = Vec::new();
            for outcome in outcomes {
                match outcome {
                    // strict longest match across all matchers; ties go to
                    // the earlier (higher-priority) matcher
                    MatchOutcome::Match(m) => {
                        if best.as_ref().is_none_or(|b| m.consumed > b.consumed) {
                            best = Some(m);
                        }
                    }
                    MatchOutcome::Error { error, consumed } => failed.push((error, consumed)),
                    MatchOutcome::NoMatch => {}
                }
            }

            if let Some(m) = best {
                trace!(
                    "[TOKENIZE] idx={} matched {} raw token(s): '{}'",
                    idx,
                    m.consumed,
                    &self.expr[m.tokens[0].1.0..m.tokens[m.tokens.len() - 1].1.1]
                );
                idx += m.consumed;
                for (token, span) in m.tokens {
                    if let ExprToken::ObjRef { kind, id, entity, .. } = &token {
                        referenced
                            .entry(*kind)
                            .or_default()
                            .entry(id.clone())
                            .or_insert(*entity);
                    }
                    tokens.push(token);
                    spans.push(span);
                }
                continue;
            }

            if !failed.is_empty() {
                // skip the longest run a matcher recognized so one bad
                // construct produces one round of errors, not several
                let advance = failed.iter().map(|(_, c)| *c).max().unwrap_or(1).max(1);
                trace!("[TOKENIZE] idx={} failed, skipping {}", idx, advance);
                errors.extend(failed.into_iter().map(|(error, _)| error));
                idx += advance;
                continue;
            }

            // plain operand pass-through
            let tok = &self.raw[idx];
            let token = match tok.kind {
                RawKind::Number => ExprToken::number(tok.text),
                RawKind::Name => {
                    unreachable!("bare names are always claimed by the related-object matcher")
                }
                kind => {
                    debug_assert!(kind.is_operator());
                    ExprToken::op(tok.text)
                }
            };
            tokens.push(token);
            spans.push((tok.start, tok.end));
            idx += 1;
        }

        if !errors.is_empty() {
            return Err(ParseErrors::new(errors));
        }

        // group referenced objects in namespace declaration order
        let mut grouped: IndexMap<EntityKind, IndexMap<SmolStr, EntityId>> = IndexMap::new();
        for kind in self.objects.kinds().collect::<Vec<_>>() {
            grouped.insert(kind, referenced.shift_remove(&kind).unwrap_or_default());
        }
        debug_assert!(referenced.is_empty());
        Ok((tokens, spans, grouped))
    }

    // ============================================================
    // Matchers
    // ============================================================

    /// Match a run of raw token kinds with no intervening whitespace,
    /// returning the covered source span. Whitespace inside a structured
    /// identifier invalidates the match.
    fn match_kinds(&self, idx: usize, pattern: &[RawKind]) -> Option<Span> {
        let run = self.raw.get(idx..idx + pattern.len())?;
        if run.iter().zip(pattern).any(|(tok, &kind)| tok.kind != kind) {
            return None;
        }
        if run.windows(2).any(|pair| pair[0].end != pair[1].start) {
            return None;
        }
        Some((run[0].start, run[pattern.len() - 1].end))
    }

    fn slice(&self, span: Span) -> &'a str {
        &self.expr[span.0..span.1]
    }

    /// Match `Type.identifier` or `Type.identifier()`.
    ///
    /// The prefix must name an entity kind the owning context may reference,
    /// and the call-vs-dotted form must agree with the kind's declared
    /// convention (callables take `()`, everything else is dotted).
    fn disambiguated_id(&self, idx: usize) -> MatchOutcome {
        // the one kind referenced with call syntax
        let call_kind = EntityKind::Function;

        if let Some(span) = self.match_kinds(idx, &CALL_DISAMBIG_PATTERN) {
            let matched = SmolStr::new(self.slice(span));
            let type_name = self.raw[idx].text;
            let ident = self.raw[idx + 2].text;
            let consumed = CALL_DISAMBIG_PATTERN.len();

            return match EntityKind::from_name(type_name, self.matching) {
                Some(kind) if kind.call_syntax() => {
                    if !self.context.can_reference(kind) {
                        return MatchOutcome::Error {
                            error: ParseError::InvalidDisambiguationType {
                                expr: self.expr.to_string(),
                                matched,
                                type_name: SmolStr::new(type_name),
                                context: self.context.name.to_string(),
                            },
                            consumed,
                        };
                    }
                    match self.objects.lookup(kind, ident, self.matching) {
                        Some((id, entity)) => MatchOutcome::Match(LexMatch {
                            consumed,
                            tokens: vec![(
                                ExprToken::ObjRef {
                                    text: matched,
                                    kind,
                                    id,
                                    entity,
                                },
                                span,
                            )],
                        }),
                        None => MatchOutcome::Error {
                            error: ParseError::NotACallableId {
                                expr: self.expr.to_string(),
                                matched,
                                kind,
                            },
                            consumed,
                        },
                    }
                }
                _ => MatchOutcome::Error {
                    error: ParseError::WrongCallPrefix {
                        expr: self.expr.to_string(),
                        matched,
                        kind: call_kind,
                    },
                    consumed,
                },
            };
        }

        if let Some(span) = self.match_kinds(idx, &MODEL_DISAMBIG_PATTERN) {
            let matched = SmolStr::new(self.slice(span));
            let type_name = self.raw[idx].text;
            let ident = self.raw[idx + 2].text;
            let consumed = MODEL_DISAMBIG_PATTERN.len();

            let error = match EntityKind::from_name(type_name, self.matching) {
                Some(kind) if kind.call_syntax() => ParseError::MissingCallSyntax {
                    expr: self.expr.to_string(),
                    matched,
                    kind,
                },
                Some(kind) if self.context.can_reference(kind) => {
                    match self.objects.lookup(kind, ident, self.matching) {
                        Some((id, entity)) => {
                            return MatchOutcome::Match(LexMatch {
                                consumed,
                                tokens: vec![(
                                    ExprToken::ObjRef {
                                        text: matched,
                                        kind,
                                        id,
                                        entity,
                                    },
                                    span,
                                )],
                            });
                        }
                        None => ParseError::NotAnId {
                            expr: self.expr.to_string(),
                            matched,
                            id: SmolStr::new(ident),
                            kind,
                        },
                    }
                }
                // unknown type name, or a kind this context may not reference
                _ => ParseError::InvalidDisambiguationType {
                    expr: self.expr.to_string(),
                    matched,
                    type_name: SmolStr::new(type_name),
                    context: self.context.name.to_string(),
                },
            };
            return MatchOutcome::Error { error, consumed };
        }

        MatchOutcome::NoMatch
    }

    /// Match `name(` where `name` is a declared math function.
    ///
    /// Consumes only the name and the opening paren; the argument list is
    /// scanned by the driver as ordinary expression content.
    fn function_call(&self, idx: usize) -> MatchOutcome {
        let Some(_) = self.match_kinds(idx, &FUNCTION_PATTERN) else {
            return MatchOutcome::NoMatch;
        };
        let name = self.raw[idx].text;
        let consumed = FUNCTION_PATTERN.len();

        if !self.context.declares_functions() {
            return MatchOutcome::Error {
                error: ParseError::NoFunctionsDeclared {
                    expr: self.expr.to_string(),
                    name: SmolStr::new(name),
                    context: self.context.name.to_string(),
                },
                consumed,
            };
        }
        if self.context.function_named(name).is_none() {
            return MatchOutcome::Error {
                error: ParseError::UnknownFunction {
                    expr: self.expr.to_string(),
                    name: SmolStr::new(name),
                    context: self.context.name.to_string(),
                },
                consumed,
            };
        }

        let name_tok = &self.raw[idx];
        let paren_tok = &self.raw[idx + 1];
        MatchOutcome::Match(LexMatch {
            consumed,
            tokens: vec![
                (
                    ExprToken::math_fun(name),
                    (name_tok.start, name_tok.end),
                ),
                (ExprToken::op("("), (paren_tok.start, paren_tok.end)),
            ],
        })
    }

    /// Match a related-object identifier: the longest structured token
    /// pattern any referenceable kind declares, or a bare name.
    ///
    /// When the structured species pattern matches but the composite id is
    /// not yet registered, the species is synthesized from its components
    /// if both resolve; this is the parse's one namespace side effect.
    fn related_object_id(&mut self, idx: usize) -> MatchOutcome {
        let mut candidates: Vec<EntityKind> = Vec::new();
        let mut longest = 0;
        let mut span = (0, 0);
        for &kind in self.context.valid_models {
            let Some(pattern) = kind.token_pattern() else {
                continue;
            };
            let Some(matched) = self.match_kinds(idx, pattern) else {
                continue;
            };
            match pattern.len().cmp(&longest) {
                std::cmp::Ordering::Greater => {
                    candidates = vec![kind];
                    longest = pattern.len();
                    span = matched;
                }
                std::cmp::Ordering::Equal => candidates.push(kind),
                std::cmp::Ordering::Less => {}
            }
        }

        if longest > 0 {
            let matched = self.slice(span);
            let hits: Vec<(EntityKind, SmolStr, EntityId)> = candidates
                .iter()
                .filter_map(|&kind| {
                    self.objects
                        .lookup(kind, matched, self.matching)
                        .map(|(id, entity)| (kind, id, entity))
                })
                .collect();
            return match hits.len() {
                1 => {
                    let (kind, id, entity) = hits.into_iter().next().unwrap_or_else(|| {
                        unreachable!("hits has exactly one element")
                    });
                    MatchOutcome::Match(LexMatch {
                        consumed: longest,
                        tokens: vec![(
                            ExprToken::ObjRef {
                                text: SmolStr::new(matched),
                                kind,
                                id,
                                entity,
                            },
                            span,
                        )],
                    })
                }
                0 => {
                    if candidates.contains(&EntityKind::Species)
                        && let Some(entity) = self.objects.get_or_create_species(
                            self.raw[idx].text,
                            self.raw[idx + 2].text,
                            self.matching,
                        )
                    {
                        let id = SmolStr::new(self.objects.entity(entity).id());
                        return MatchOutcome::Match(LexMatch {
                            consumed: longest,
                            tokens: vec![(
                                ExprToken::ObjRef {
                                    text: SmolStr::new(matched),
                                    kind: EntityKind::Species,
                                    id,
                                    entity,
                                },
                                span,
                            )],
                        });
                    }
                    MatchOutcome::Error {
                        error: ParseError::UnresolvedIds {
                            expr: self.expr.to_string(),
                            ids: vec![SmolStr::new(matched)],
                        },
                        consumed: longest,
                    }
                }
                _ => MatchOutcome::Error {
                    error: ParseError::AmbiguousId {
                        expr: self.expr.to_string(),
                        id: SmolStr::new(matched),
                        kinds: hits.into_iter().map(|(kind, _, _)| kind).collect(),
                    },
                    consumed: longest,
                },
            };
        }

        // bare name fallback, resolved across the kinds this context may
        // reference, in namespace declaration order
        if self.raw[idx].kind == RawKind::Name {
            let tok = &self.raw[idx];
            let hits: Vec<_> = self
                .objects
                .resolve(tok.text, self.matching)
                .into_iter()
                .filter(|hit| self.context.can_reference(hit.kind))
                .collect();
            return match hits.len() {
                0 => MatchOutcome::Error {
                    error: ParseError::UnresolvedIds {
                        expr: self.expr.to_string(),
                        ids: vec![SmolStr::new(tok.text)],
                    },
                    consumed: 1,
                },
                1 => {
                    let hit = hits.into_iter().next().unwrap_or_else(|| {
                        unreachable!("hits has exactly one element")
                    });
                    MatchOutcome::Match(LexMatch {
                        consumed: 1,
                        tokens: vec![(
                            ExprToken::ObjRef {
                                text: SmolStr::new(tok.text),
                                kind: hit.kind,
                                id: hit.id,
                                entity: hit.entity,
                            },
                            (tok.start, tok.end),
                        )],
                    })
                }
                _ => MatchOutcome::Error {
                    error: ParseError::AmbiguousId {
                        expr: self.expr.to_string(),
                        id: SmolStr::new(tok.text),
                        kinds: hits.into_iter().map(|hit| hit.kind).collect(),
                    },
                    consumed: 1,
                },
            };
        }

        MatchOutcome::NoMatch
    }
}
