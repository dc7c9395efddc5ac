use super::TokenKind;

/// A byte trie over punctuation strings, used to find the longest operator
/// or punctuation symbol starting at an input position.
pub struct FieldTree {
    token: Option<TokenKind>,
    children: Vec<(u8, FieldTree)>,
}

impl FieldTree {
    pub fn new() -> Self {
        Self {
            token: None,
            children: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: &[u8], token: TokenKind) -> Result<(), TokenKind> {
        if let Some((first, rest)) = value.split_first() {
            match self.children.binary_search_by_key(first, |child| child.0) {
                Ok(index) => self.children[index].1.insert(rest, token),
                Err(index) => {
                    let mut field = FieldTree::new();
                    field.insert(rest, token)?;
                    self.children.insert(index, (*first, field));
                    Ok(())
                }
            }
        } else {
            match self.token.replace(token) {
                Some(t) => Err(t),
                None => Ok(()),
            }
        }
    }

    /// Find the longest inserted string which prefixes `code_part`, together
    /// with its length.
    pub fn find(&self, code_part: &[u8]) -> Option<(TokenKind, usize)> {
        let mut current_field = self;
        let mut index = 0;

        loop {
            if code_part.len() > index {
                match current_field
                    .children
                    .binary_search_by_key(&code_part[index], |s| s.0)
                {
                    Ok(i) => {
                        index += 1;
                        current_field = &current_field.children[i].1;
                    }
                    Err(_) => break current_field.token.map(|t| (t, index)),
                }
            } else {
                break current_field.token.map(|t| (t, index));
            }
        }
    }
}
