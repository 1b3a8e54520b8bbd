use nom::{
    character::complete::{digit1, none_of},
    Finish,
    IResult,
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    sequence::{delimited, preceded, separated_pair, terminated, tuple},
    multi::many0,
    branch::alt,
    bytes::complete::{tag, take_while, escaped_transform},
};
use tnetstring::Value;
use anyhow::{anyhow, Result};
use base64::decode;
use std::borrow::Cow;
use std::collections::BTreeMap;

const WHITESPACE: &'static str = " \t\r\n";
const B64_CHARS: &'static str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn white(i: &str) -> IResult<&str, &str> {
    take_while(move |c| WHITESPACE.contains(c))(i)
}

fn keyword(i: &str) -> IResult<&str, Value<'static>> {
    alt((
            map(tag("null"), |_| Value::Null),
            map(tag("true"), |_| Value::Bool(true)),
            map(tag("false"),|_| Value::Bool(false))
    ))(i)
}

fn float(i: &str) -> IResult<&str, f64> {
    map_res(recognize(tuple((opt(tag("-")), digit1, tag("."), digit1))), |n: &str| n.parse())(i)
}

fn int(i: &str) -> IResult<&str, i32> {
    map_res(recognize(tuple((opt(tag("-")), digit1))), |n: &str| n.parse())(i)
}

fn b64(i: &str) -> IResult<&str, &str> {
    recognize(tuple((take_while(move |c| B64_CHARS.contains(c)), opt(tag("=")), opt(tag("=")))))(i)
}

fn bytes(i: &str) -> IResult<&str, Vec<u8>> {
    map_res(delimited(tag("'"), b64, tag("'")), decode)(i)
}

fn string(i: &str) -> IResult<&str, String> {
    delimited(
            tag("\""),
            map(opt(escaped_transform(
                none_of("\\\""),
                '\\',
                alt((
                        value("\\", tag("\\")),
                        value("\"", tag("\"")),
                        value("\n", tag("n")),
                )))), |c| c.unwrap_or("".into())),
            tag("\"")
    )(i)
}

fn key(i: &str) -> IResult<&str, Vec<u8>> {
    alt((
        map(string, String::into_bytes),
        bytes,
    ))(i)
}

fn element(i: &str) -> IResult<&str, Value<'static>> {
    terminated(preceded(white, tq_value), tuple((white, opt(tag(",")))))(i)
}

fn entry(i: &str) -> IResult<&str, (Vec<u8>, Value<'static>)> {
    separated_pair(
        preceded(white, key),
        tuple((white, tag(":"))),
        element,
    )(i)
}

fn list(i: &str) -> IResult<&str, Value<'static>> {
    map(delimited(tag("["), many0(element), preceded(white, tag("]"))), Value::List)(i)
}

fn dict(i: &str) -> IResult<&str, Value<'static>> {
    map(delimited(tag("{"), many0(entry), preceded(white, tag("}"))), |entries| {
        Value::Dict(entries.into_iter().map(|(k, v)| (Cow::Owned(k), v)).collect::<BTreeMap<_, _>>())
    })(i)
}

fn tq_value(i: &str) -> IResult<&str, Value<'static>> {
    alt((
        map(string, |s| Value::Str(Cow::Owned(s.into_bytes()))),
        map(bytes, |b| Value::Str(Cow::Owned(b))),
        map(float, Value::Float),
        map(int, Value::Int),
        keyword,
        list,
        dict,
    ))(i)
}

pub fn parse(i: &str) -> Result<Value<'static>> {
    Ok(all_consuming(delimited(white, tq_value, white))(i).finish().map_err(|e| anyhow!("{}", e))?.1)
}

#[cfg(test)]
mod tests {
    use super::parse;
    use tnetstring::Value;
    use std::borrow::Cow;
    use std::collections::BTreeMap;

    #[test]
    fn scalars() {
        assert_eq!(Value::Null, parse("null").unwrap());
        assert_eq!(Value::Bool(false), parse("false").unwrap());
        assert_eq!(Value::Int(-42), parse(" -42 ").unwrap());
        assert_eq!(Value::Float(1.23), parse("1.23").unwrap());
        assert_eq!(Value::Str(Cow::Borrowed(b"say \"hi\"\n")), parse(r#""say \"hi\"\n""#).unwrap());
        assert_eq!(Value::Str(Cow::Borrowed(&[0xff, 0x00, 0xc3, 0x28])), parse("'/wDDKA=='").unwrap());
    }

    #[test]
    fn composites() {
        assert_eq!(Value::List(vec![]), parse("[]").unwrap());
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Str(Cow::Borrowed(b"a")), Value::Null]),
            parse("[1, \"a\", null]").unwrap(),
        );
        assert_eq!(
            Value::Dict(BTreeMap::from([
                (Cow::Borrowed(b"key".as_ref()), Value::Int(1)),
            ])),
            parse("{ \"key\": 1, }").unwrap(),
        );
    }

    #[test]
    fn accepts_own_rendition() {
        let value = Value::List(vec![
            Value::Int(7),
            Value::Dict(BTreeMap::from([
                (Cow::Borrowed(b"name".as_ref()), Value::Str(Cow::Borrowed(b"Jessica"))),
            ])),
        ]);
        assert_eq!(value, parse(&format!("{}", value)).unwrap());
    }

}
