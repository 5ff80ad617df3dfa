//! Signature codec
//!
//! Turns declared parameter and return types into two encodings:
//!
//! - the **wire descriptor** handed to the foreign runtime for member lookup,
//!   e.g. `(ILjava/lang/String;[F)V`
//! - the **tag text** the marshaller walks, one tag per value slot
//!
//! # Tag text
//!
//! ```text
//! V            void (return position only)
//! Z I J F      boolean, int, long, float
//! s            string
//! L<name>;     object of the dotted class <name>
//! c            object whose class is decided by its runtime type
//! [<tag>       array of <tag>
//! ```
//!
//! Tags are parsed by recursive descent: [`parse_tag`] returns one tag plus
//! the unconsumed remainder, so scalar and array parsing never share a
//! cursor.

use std::fmt;

use jbridge_sdk::STRING_DESCRIPTOR;

use crate::class::ScriptClassRef;

/// Malformed tag text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// Input ended where a tag was expected
    #[error("unexpected end of signature")]
    Empty,

    /// Unrecognised tag character
    #[error("unknown type tag '{0}'")]
    UnknownTag(char),

    /// `L` without a closing `;`
    #[error("unterminated class path '{0}'")]
    UnterminatedPath(String),

    /// `V` where a value is required
    #[error("void is not a value type")]
    VoidValue,
}

/// A declared type, as the script side describes it
#[derive(Debug, Clone)]
pub enum TypeDecl {
    /// No value (return position only)
    Void,
    /// boolean
    Boolean,
    /// 32-bit int
    Int,
    /// 64-bit long
    Long,
    /// 32-bit float
    Float,
    /// `java.lang.String`, marshalled as a script string
    String,
    /// Object of a statically declared class
    Object(ScriptClassRef),
    /// Object whose script class follows its runtime type; the declared
    /// class only provides the wire descriptor
    Dynamic(ScriptClassRef),
    /// Array of the element type
    Array(Box<TypeDecl>),
}

impl TypeDecl {
    /// Array of `elem`
    pub fn array_of(elem: TypeDecl) -> Self {
        TypeDecl::Array(Box::new(elem))
    }

    fn write_tag(&self, out: &mut String) {
        match self {
            TypeDecl::Void => out.push('V'),
            TypeDecl::Boolean => out.push('Z'),
            TypeDecl::Int => out.push('I'),
            TypeDecl::Long => out.push('J'),
            TypeDecl::Float => out.push('F'),
            TypeDecl::String => out.push('s'),
            TypeDecl::Object(cls) => {
                out.push('L');
                out.push_str(cls.foreign_name());
                out.push(';');
            }
            TypeDecl::Dynamic(_) => out.push('c'),
            TypeDecl::Array(elem) => {
                out.push('[');
                elem.write_tag(out);
            }
        }
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            TypeDecl::Void => out.push('V'),
            TypeDecl::Boolean => out.push('Z'),
            TypeDecl::Int => out.push('I'),
            TypeDecl::Long => out.push('J'),
            TypeDecl::Float => out.push('F'),
            TypeDecl::String => out.push_str(STRING_DESCRIPTOR),
            TypeDecl::Object(cls) | TypeDecl::Dynamic(cls) => {
                out.push('L');
                out.push_str(&cls.path());
                out.push(';');
            }
            TypeDecl::Array(elem) => {
                out.push('[');
                elem.write_descriptor(out);
            }
        }
    }

    /// Tag text of this type
    pub fn tag_text(&self) -> String {
        let mut out = String::new();
        self.write_tag(&mut out);
        out
    }

    /// Wire descriptor of this type
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }
}

/// One parsed tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    /// `V`
    Void,
    /// `Z`
    Boolean,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `F`
    Float,
    /// `s`
    Str,
    /// `L<name>;` with the dotted class name
    Object(Box<str>),
    /// `c`
    DynamicClass,
    /// `[<tag>`
    Array(Box<TypeTag>),
}

impl TypeTag {
    /// Array nesting depth (0 for scalars)
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cur = self;
        while let TypeTag::Array(elem) = cur {
            depth += 1;
            cur = elem;
        }
        depth
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Void => f.write_str("V"),
            TypeTag::Boolean => f.write_str("Z"),
            TypeTag::Int => f.write_str("I"),
            TypeTag::Long => f.write_str("J"),
            TypeTag::Float => f.write_str("F"),
            TypeTag::Str => f.write_str("s"),
            TypeTag::Object(name) => write!(f, "L{};", name),
            TypeTag::DynamicClass => f.write_str("c"),
            TypeTag::Array(elem) => write!(f, "[{}", elem),
        }
    }
}

/// Parse one tag, returning it with the unconsumed remainder.
///
/// `V` is accepted here; callers that need a value use [`parse_value_tag`].
pub fn parse_tag(input: &str) -> Result<(TypeTag, &str), SignatureError> {
    let mut chars = input.chars();
    let head = chars.next().ok_or(SignatureError::Empty)?;
    let rest = chars.as_str();
    let tag = match head {
        'V' => TypeTag::Void,
        'Z' => TypeTag::Boolean,
        'I' => TypeTag::Int,
        'J' => TypeTag::Long,
        'F' => TypeTag::Float,
        's' => TypeTag::Str,
        'c' => TypeTag::DynamicClass,
        'L' => {
            let end = rest
                .find(';')
                .ok_or_else(|| SignatureError::UnterminatedPath(rest.to_string()))?;
            return Ok((TypeTag::Object(rest[..end].into()), &rest[end + 1..]));
        }
        '[' => {
            let (elem, rest) = parse_value_tag(rest)?;
            return Ok((TypeTag::Array(Box::new(elem)), rest));
        }
        other => return Err(SignatureError::UnknownTag(other)),
    };
    Ok((tag, rest))
}

/// Parse one tag that must denote a value
pub fn parse_value_tag(input: &str) -> Result<(TypeTag, &str), SignatureError> {
    match parse_tag(input)? {
        (TypeTag::Void, _) => Err(SignatureError::VoidValue),
        parsed => Ok(parsed),
    }
}

/// Parse a whole parameter tag sequence
pub fn parse_tags(mut input: &str) -> Result<Vec<TypeTag>, SignatureError> {
    let mut tags = Vec::new();
    while !input.is_empty() {
        let (tag, rest) = parse_value_tag(input)?;
        tags.push(tag);
        input = rest;
    }
    Ok(tags)
}

/// Encoded signature of one method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    ret: TypeTag,
    params: Vec<TypeTag>,
    types: String,
    descriptor: String,
}

impl Signature {
    /// Encode a declared method type.
    ///
    /// Constructors always use a `V` return in the wire descriptor; the
    /// declared return is still kept as the return tag.
    pub fn build(
        ret: &TypeDecl,
        params: &[TypeDecl],
        constructor: bool,
    ) -> Result<Self, SignatureError> {
        let mut types = String::new();
        let mut descriptor = String::from("(");
        for param in params {
            param.write_tag(&mut types);
            param.write_descriptor(&mut descriptor);
        }
        descriptor.push(')');
        if constructor {
            descriptor.push('V');
        } else {
            ret.write_descriptor(&mut descriptor);
        }

        let ret_text = ret.tag_text();
        let (ret, rest) = parse_tag(&ret_text)?;
        debug_assert!(rest.is_empty());
        let params = parse_tags(&types)?;
        Ok(Self {
            ret,
            params,
            types,
            descriptor,
        })
    }

    /// Parsed return tag
    pub fn ret(&self) -> &TypeTag {
        &self.ret
    }

    /// Parsed parameter tags
    pub fn params(&self) -> &[TypeTag] {
        &self.params
    }

    /// Parameter tag text
    pub fn types(&self) -> &str {
        &self.types
    }

    /// Wire descriptor
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
