extern crate proc_macro;

use proc_macro::{Delimiter, Group, Spacing, TokenStream, TokenTree};

struct EventStruct {
    name: String,
    parent: Option<ParentField>,
}

struct ParentField {
    access: String,
    ty: String,
}

fn parse_event_struct(input: TokenStream) -> EventStruct {
    let mut iter = input.into_iter();
    loop {
        match iter.next() {
            Some(TokenTree::Ident(ident)) => {
                let keyword = ident.to_string();
                if keyword == "enum" || keyword == "union" {
                    panic!("Event can only be derived for structs, found {}", keyword);
                }
                if keyword == "struct" {
                    break;
                }
            },
            None => panic!("no type name found"),
            _ => (),
        }
    }

    let name = match iter.next() {
        Some(TokenTree::Ident(ident)) => ident.to_string(),
        _ => panic!("no type name found"),
    };

    let mut parent = None;
    for token in iter {
        match token {
            TokenTree::Punct(ref punct) if punct.as_char() == '<' => {
                panic!("Event cannot be derived for generic struct {}", name);
            },
            TokenTree::Group(ref group) if group.delimiter() == Delimiter::Brace => {
                parent = find_parent_field(&name, group, true);
                break;
            },
            TokenTree::Group(ref group) if group.delimiter() == Delimiter::Parenthesis => {
                parent = find_parent_field(&name, group, false);
                break;
            },
            _ => (),
        }
    }

    EventStruct {
        name,
        parent,
    }
}

// Splits a field list on commas that are not nested inside angle brackets.
fn split_fields(group: &Group) -> Vec<Vec<TokenTree>> {
    let mut fields = Vec::new();
    let mut current = Vec::new();
    let mut angle_depth = 0usize;
    let mut previous_joint_dash = false;

    for token in group.stream() {
        let mut joint_dash = false;
        if let TokenTree::Punct(ref punct) = token {
            match punct.as_char() {
                '<' => angle_depth += 1,
                '>' if !previous_joint_dash => angle_depth = angle_depth.saturating_sub(1),
                ',' if angle_depth == 0 => {
                    fields.push(std::mem::replace(&mut current, Vec::new()));
                    previous_joint_dash = false;
                    continue;
                },
                '-' => joint_dash = punct.spacing() == Spacing::Joint,
                _ => (),
            }
        }
        previous_joint_dash = joint_dash;
        current.push(token);
    }

    if !current.is_empty() {
        fields.push(current);
    }
    fields
}

fn is_parent_attribute(token: &TokenTree) -> bool {
    match token {
        TokenTree::Group(group) if group.delimiter() == Delimiter::Bracket => {
            match group.stream().into_iter().next() {
                Some(TokenTree::Ident(ident)) => ident.to_string() == "parent",
                _ => false,
            }
        },
        _ => false,
    }
}

fn find_parent_field(name: &str, group: &Group, named: bool) -> Option<ParentField> {
    let mut found: Option<ParentField> = None;

    for (index, field) in split_fields(group).into_iter().enumerate() {
        let mut tokens = field.into_iter().peekable();
        let mut marked = false;

        // Attributes
        while let Some(TokenTree::Punct(punct)) = tokens.peek() {
            if punct.as_char() != '#' {
                break;
            }
            tokens.next();
            if let Some(attribute) = tokens.next() {
                marked |= is_parent_attribute(&attribute);
            }
        }

        // Visibility
        if let Some(TokenTree::Ident(ident)) = tokens.peek() {
            if ident.to_string() == "pub" {
                tokens.next();
                if let Some(TokenTree::Group(group)) = tokens.peek() {
                    if group.delimiter() == Delimiter::Parenthesis {
                        tokens.next();
                    }
                }
            }
        }

        let access = if named {
            let field_name = match tokens.next() {
                Some(TokenTree::Ident(ident)) => ident.to_string(),
                _ => panic!("malformed field in {}", name),
            };
            match tokens.next() {
                Some(TokenTree::Punct(ref punct)) if punct.as_char() == ':' => (),
                _ => panic!("malformed field {} in {}", field_name, name),
            }
            field_name
        } else {
            index.to_string()
        };

        if marked {
            if found.is_some() {
                panic!("{} has more than one #[parent] field", name);
            }
            found = Some(ParentField {
                access,
                ty: tokens.collect::<TokenStream>().to_string(),
            });
        }
    }

    found
}

/// Implements `teagmhas::Event` for a struct.
///
/// A field marked `#[parent]` holds the payload of the parent event type. Without one the
/// struct derives directly from the root event type.
#[proc_macro_derive(Event, attributes(parent))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let event = parse_event_struct(input);

    let (parent_type, parent_event) = match event.parent {
        Some(ParentField { access, ty }) => (
            format!("::teagmhas::EventType::of::<{}>()", ty),
            format!("::std::option::Option::Some(&mut self.{})", access),
        ),
        None => (
            "::teagmhas::EventType::base()".to_string(),
            "::std::option::Option::None".to_string(),
        ),
    };

    format!("
impl ::teagmhas::Event for {0} {{
    fn event_type(&self) -> ::teagmhas::EventType {{
        ::teagmhas::EventType::of::<Self>()
    }}

    fn parent_type() -> ::teagmhas::EventType {{
        {1}
    }}

    fn parent_event_mut(&mut self) -> ::std::option::Option<&mut dyn ::teagmhas::Event> {{
        {2}
    }}
}}", event.name, parent_type, parent_event).parse().unwrap()
}
