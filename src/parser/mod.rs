mod graphs_parser;

pub use graphs_parser::{load_instance, parse_instance, Instance};

pub type Input<'a> = &'a str;
pub type ParseError<'a> = nom::error::VerboseError<Input<'a>>;
pub type ParseResult<'a, O> = nom::IResult<Input<'a>, O, ParseError<'a>>;
