//! Preprocessor directive bodies
//!
//! The lexer hands `#macro`, `#region` and `#endregion` lines over as single
//! `Directive` tokens; this module splits them into their parts.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, space0, space1},
    combinator::opt,
    sequence::terminated,
    IResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `#macro [CONFIG:]NAME value`
    Macro {
        config: Option<&'a str>,
        name: &'a str,
        value: &'a str,
    },
    Region {
        name: &'a str,
    },
    EndRegion {
        name: &'a str,
    },
}

/// Split a directive token's text. Returns `None` when the text is not a
/// well-formed directive, e.g. a `#macro` without a name.
pub fn parse_directive(text: &str) -> Option<Directive<'_>> {
    alt((macro_directive, end_region_directive, region_directive))(text)
        .ok()
        .map(|(_, directive)| directive)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn macro_directive(input: &str) -> IResult<&str, Directive<'_>> {
    let (input, _) = tag("#macro")(input)?;
    let (input, _) = space1(input)?;
    let (input, config) = opt(terminated(identifier, char(':')))(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = space0(input)?;

    Ok((
        "",
        Directive::Macro {
            config,
            name,
            value: input.trim_end(),
        },
    ))
}

fn region_directive(input: &str) -> IResult<&str, Directive<'_>> {
    let (input, _) = tag("#region")(input)?;
    Ok(("", Directive::Region { name: input.trim() }))
}

fn end_region_directive(input: &str) -> IResult<&str, Directive<'_>> {
    let (input, _) = tag("#endregion")(input)?;
    Ok(("", Directive::EndRegion { name: input.trim() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_with_config() {
        assert_eq!(
            parse_directive("#macro Desktop:SCALE 2"),
            Some(Directive::Macro {
                config: Some("Desktop"),
                name: "SCALE",
                value: "2",
            })
        );
    }

    #[test]
    fn macro_without_name() {
        assert_eq!(parse_directive("#macro"), None);
        assert_eq!(parse_directive("#macro   "), None);
    }

    #[test]
    fn region_names() {
        assert_eq!(
            parse_directive("#region Movement code "),
            Some(Directive::Region { name: "Movement code" })
        );
        assert_eq!(
            parse_directive("#endregion"),
            Some(Directive::EndRegion { name: "" })
        );
    }
}
