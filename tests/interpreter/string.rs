//! String tests: String constructor and String.prototype methods

use super::{eval, s, throws_error};
use stepjs::JsValue;

#[test]
fn test_length_and_indexing() {
    assert_eq!(eval("'hello'.length"), JsValue::Number(5.0));
    assert_eq!(eval("'hello'[1]"), s("e"));
    assert_eq!(eval("'hello'[10]"), JsValue::Undefined);
    assert_eq!(eval("'\\u00e9t\\u00e9'.length"), JsValue::Number(3.0));
}

#[test]
fn test_surrogate_pairs_count_as_two_units() {
    assert_eq!(eval("'a\\ud83d\\ude00b'.length"), JsValue::Number(4.0));
    assert_eq!(eval("'a\\ud83d\\ude00b'.charCodeAt(1)"), JsValue::Number(55357.0));
}

#[test]
fn test_string_constructor() {
    assert_eq!(eval("String(123)"), s("123"));
    assert_eq!(eval("String()"), s(""));
    assert_eq!(eval("String(null)"), s("null"));
    assert_eq!(eval("typeof new String('x')"), s("object"));
    assert_eq!(eval("new String('abc').length"), JsValue::Number(3.0));
    assert_eq!(eval("new String('abc') + 'd'"), s("abcd"));
}

#[test]
fn test_from_char_code() {
    assert_eq!(eval("String.fromCharCode(72, 105)"), s("Hi"));
}

#[test]
fn test_char_at_and_char_code_at() {
    assert_eq!(eval("'abc'.charAt(2)"), s("c"));
    assert_eq!(eval("'abc'.charAt(5)"), s(""));
    assert_eq!(eval("'abc'.charCodeAt(0)"), JsValue::Number(97.0));
    assert_eq!(eval("isNaN('abc'.charCodeAt(9))"), JsValue::Boolean(true));
}

#[test]
fn test_index_of_and_last_index_of() {
    assert_eq!(eval("'banana'.indexOf('an')"), JsValue::Number(1.0));
    assert_eq!(eval("'banana'.indexOf('an', 2)"), JsValue::Number(3.0));
    assert_eq!(eval("'banana'.lastIndexOf('an')"), JsValue::Number(3.0));
    assert_eq!(eval("'banana'.indexOf('x')"), JsValue::Number(-1.0));
}

#[test]
fn test_slice_substring_substr() {
    assert_eq!(eval("'abcdef'.slice(1, 4)"), s("bcd"));
    assert_eq!(eval("'abcdef'.slice(-2)"), s("ef"));
    assert_eq!(eval("'abcdef'.substring(4, 1)"), s("bcd"));
    assert_eq!(eval("'abcdef'.substring(-3, 2)"), s("ab"));
    assert_eq!(eval("'abcdef'.substr(2, 3)"), s("cde"));
    assert_eq!(eval("'abcdef'.substr(-2)"), s("ef"));
}

#[test]
fn test_case_conversion() {
    assert_eq!(eval("'MiXeD'.toLowerCase()"), s("mixed"));
    assert_eq!(eval("'MiXeD'.toUpperCase()"), s("MIXED"));
}

#[test]
fn test_trim() {
    assert_eq!(eval("'  pad \\n'.trim()"), s("pad"));
    assert_eq!(eval("'  pad  '.trimLeft()"), s("pad  "));
    assert_eq!(eval("'  pad  '.trimRight()"), s("  pad"));
}

#[test]
fn test_split() {
    assert_eq!(eval("'a,b,,c'.split(',').length"), JsValue::Number(4.0));
    assert_eq!(eval("'a,b,c'.split(',', 2).join('|')"), s("a|b"));
    assert_eq!(eval("'abc'.split('').join('|')"), s("a|b|c"));
    assert_eq!(eval("'abc'.split().length"), JsValue::Number(1.0));
    assert_eq!(eval("''.split(',').length"), JsValue::Number(1.0));
}

#[test]
fn test_split_with_regexp() {
    assert_eq!(eval("'a1b22c'.split(/\\d+/).join('|')"), s("a|b|c"));
    assert_eq!(eval("'a1b2c'.split(/(\\d)/).join('|')"), s("a|1|b|2|c"));
}

#[test]
fn test_replace_with_string() {
    assert_eq!(eval("'aaa'.replace('a', 'b')"), s("baa"));
    assert_eq!(eval("'aaa'.replace(/a/g, 'b')"), s("bbb"));
    assert_eq!(eval("'John Smith'.replace(/(\\w+)\\s(\\w+)/, '$2, $1')"), s("Smith, John"));
    assert_eq!(eval("'abc'.replace('b', '[$&]')"), s("a[b]c"));
    assert_eq!(eval("'abc'.replace('b', '$$')"), s("a$c"));
    assert_eq!(eval("'abc'.replace('b', \"$`$'\")"), s("aacc"));
}

#[test]
fn test_replace_with_function() {
    assert_eq!(
        eval("'a1b2'.replace(/\\d/g, function(d) { return d * 2; })"),
        s("a2b4")
    );
    assert_eq!(
        eval("'x-y'.replace('-', function(m, at) { return '[' + at + ']'; })"),
        s("x[1]y")
    );
    assert_eq!(
        eval("'2024-01'.replace(/(\\d+)-(\\d+)/, function(all, y, m) { return m + '/' + y; })"),
        s("01/2024")
    );
}

#[test]
fn test_match_and_search() {
    assert_eq!(eval("'a1b22'.match(/\\d+/g).join(',')"), s("1,22"));
    assert_eq!(eval("var m = 'key=val'.match(/(\\w+)=(\\w+)/); m[2] + m.index"), s("val0"));
    assert_eq!(eval("'abc'.match(/x/)"), JsValue::Null);
    assert_eq!(eval("'hello'.search(/l+/)"), JsValue::Number(2.0));
    assert_eq!(eval("'hello'.search('z')"), JsValue::Number(-1.0));
}

#[test]
fn test_concat_and_locale_compare() {
    assert_eq!(eval("'a'.concat('b', 1)"), s("ab1"));
    assert_eq!(eval("'a'.localeCompare('b')"), JsValue::Number(-1.0));
    assert_eq!(eval("'b'.localeCompare('b')"), JsValue::Number(0.0));
}

#[test]
fn test_to_string_requires_string_receiver() {
    assert_eq!(eval("new String('w').toString()"), s("w"));
    assert!(throws_error("String.prototype.toString.call({})", "requires that 'this' be a String"));
}

#[test]
fn test_methods_reject_null_receiver() {
    assert!(throws_error(
        "String.prototype.trim.call(null)",
        "String.prototype.trim called on null or undefined"
    ));
}

#[test]
fn test_strings_are_immutable() {
    assert_eq!(eval("var t = 'abc'; t[0] = 'z'; t"), s("abc"));
}

#[test]
fn test_string_escapes() {
    assert_eq!(eval("'tab\\there'.length"), JsValue::Number(8.0));
    assert_eq!(eval("'\\x41\\u0042'"), s("AB"));
    assert_eq!(eval("\"it's\""), s("it's"));
}
