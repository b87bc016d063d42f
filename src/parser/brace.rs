//! Lexically aware brace matching for embedded script blocks.
//!
//! Code-shaped blocks (`script:pre-request`, `tests`, …) contain source in
//! the embedded script language, so finding the block's closing `}` must
//! respect string, template-literal and comment boundaries. A naive brace
//! counter miscounts on something as ordinary as `let s = "}"`, which makes
//! full lexical awareness a correctness requirement here.
//!
//! The matcher sits behind the narrow [`BraceMatcher`] trait so a host can
//! swap in the embedded language's own parser without touching the block
//! model.

/// Finds the closing brace matching an opening brace in embedded source.
pub trait BraceMatcher {
    /// Given `text` and the byte offset of an opening `{`, returns the byte
    /// offset of the matching `}`, or `None` when the brace is never
    /// closed.
    fn find_matching_closing_brace(&self, text: &str, open_offset: usize) -> Option<usize>;
}

/// Lexer state while scanning embedded script source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    /// Plain code
    Code,
    /// Inside a `'…'` or `"…"` string; the char is the quote
    Str(char),
    /// Inside a template literal
    Template,
    /// Inside a `// …` comment
    LineComment,
    /// Inside a `/* … */` comment
    BlockComment,
}

/// The default [`BraceMatcher`], a hand-rolled lexer for JavaScript-style
/// embedded source.
///
/// Handles single- and double-quoted strings with escapes, line and block
/// comments, and template literals including nested `${ … }` interpolation
/// (inside which braces count again, recursively).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptBraceMatcher;

impl BraceMatcher for ScriptBraceMatcher {
    fn find_matching_closing_brace(&self, text: &str, open_offset: usize) -> Option<usize> {
        let bytes = text.as_bytes();
        if open_offset >= text.len() || bytes[open_offset] != b'{' {
            return None;
        }

        // Brace depth per template-nesting level. The last entry is the
        // current level; entering `${` pushes a level, its matching `}`
        // pops back into the template.
        let mut depth_stack: Vec<i32> = vec![0];
        // Lexer state per template-nesting level.
        let mut state_stack: Vec<LexState> = vec![LexState::Code];

        let mut chars = text[open_offset..].char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let offset = open_offset + i;
            let state = *state_stack.last()?;
            match state {
                LexState::Code => match c {
                    '{' => {
                        if let Some(depth) = depth_stack.last_mut() {
                            *depth += 1;
                        }
                    }
                    '}' => {
                        let depth = depth_stack.last_mut()?;
                        *depth -= 1;
                        let depth = *depth;
                        if depth == 0 && depth_stack.len() == 1 {
                            return Some(offset);
                        }
                        if depth == 0 && depth_stack.len() > 1 {
                            // Closing a ${ … } interpolation.
                            depth_stack.pop();
                            state_stack.pop();
                            debug_assert_eq!(state_stack.last(), Some(&LexState::Template));
                        }
                    }
                    '\'' | '"' => {
                        *state_stack.last_mut()? = LexState::Str(c);
                    }
                    '`' => {
                        *state_stack.last_mut()? = LexState::Template;
                    }
                    '/' => match chars.peek() {
                        Some((_, '/')) => {
                            chars.next();
                            *state_stack.last_mut()? = LexState::LineComment;
                        }
                        Some((_, '*')) => {
                            chars.next();
                            *state_stack.last_mut()? = LexState::BlockComment;
                        }
                        _ => {}
                    },
                    _ => {}
                },
                LexState::Str(quote) => match c {
                    '\\' => {
                        chars.next();
                    }
                    '\n' => {
                        // Unterminated string; recover at end of line.
                        *state_stack.last_mut()? = LexState::Code;
                    }
                    c if c == quote => {
                        *state_stack.last_mut()? = LexState::Code;
                    }
                    _ => {}
                },
                LexState::Template => match c {
                    '\\' => {
                        chars.next();
                    }
                    '`' => {
                        *state_stack.last_mut()? = LexState::Code;
                    }
                    '$' => {
                        if matches!(chars.peek(), Some((_, '{'))) {
                            chars.next();
                            depth_stack.push(1);
                            state_stack.push(LexState::Code);
                        }
                    }
                    _ => {}
                },
                LexState::LineComment => {
                    if c == '\n' {
                        *state_stack.last_mut()? = LexState::Code;
                    }
                }
                LexState::BlockComment => {
                    if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                        chars.next();
                        *state_stack.last_mut()? = LexState::Code;
                    }
                }
            }
        }

        None
    }
}

/// Matches a closing brace with the default [`ScriptBraceMatcher`].
pub fn find_matching_closing_brace(text: &str, open_offset: usize) -> Option<usize> {
    ScriptBraceMatcher.find_matching_closing_brace(text, open_offset)
}
