//! Token-budgeted context assembly.

use crate::types::SearchResult;

/// Characters per token used by [`estimate_tokens`].
pub const CHARS_PER_TOKEN: usize = 4;

/// Rough token count: characters divided by four.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Pack results, best first, into a context string of at most `token_budget`
/// estimated tokens.
///
/// Stops at the first result that would overflow the budget; nothing after it
/// is considered and nothing is truncated. Each included result becomes a
/// `Source: <title>` block, blocks separated by a blank line.
pub fn assemble(results: &[SearchResult], token_budget: usize) -> String {
    let mut blocks = Vec::new();
    let mut used = 0;

    for result in results {
        let cost = estimate_tokens(&result.text);
        if used + cost > token_budget {
            break;
        }
        used += cost;
        blocks.push(format!("Source: {}\n{}", result.title(), result.text));
    }

    blocks.join("\n\n")
}

/// Assembled context together with the results that made it in.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    pub text: String,
    pub included: Vec<SearchResult>,
    pub estimated_tokens: usize,
}

impl AssembledContext {
    /// Same packing rule as [`assemble`], keeping track of what was used.
    pub fn build(results: Vec<SearchResult>, token_budget: usize) -> Self {
        let mut included = Vec::new();
        let mut used = 0;

        for result in results {
            let cost = estimate_tokens(&result.text);
            if used + cost > token_budget {
                break;
            }
            used += cost;
            included.push(result);
        }

        Self {
            text: assemble(&included, token_budget),
            included,
            estimated_tokens: used,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
