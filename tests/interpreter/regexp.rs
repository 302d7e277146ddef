//! RegExp tests: literals, constructor, exec/test and lastIndex handling

use super::{eval, s, throws_error};
use stepjs::JsValue;

#[test]
fn test_literal_properties() {
    assert_eq!(
        eval("var r = /ab+c/gi; [r.source, r.global, r.ignoreCase, r.multiline, r.lastIndex].join(',')"),
        s("ab+c,true,true,false,0")
    );
}

#[test]
fn test_to_string() {
    assert_eq!(eval("String(/a\\/b/m)"), s("/a\\/b/m"));
    assert_eq!(eval("new RegExp('').toString()"), s("/(?:)/"));
    assert_eq!(eval("/x/gim.toString()"), s("/x/gim"));
}

#[test]
fn test_test_method() {
    assert_eq!(eval("/^\\d{3}$/.test('123')"), JsValue::Boolean(true));
    assert_eq!(eval("/^\\d{3}$/.test('12a')"), JsValue::Boolean(false));
    assert_eq!(eval("/HELLO/i.test('say hello')"), JsValue::Boolean(true));
}

#[test]
fn test_exec_returns_groups_index_input() {
    assert_eq!(
        eval(
            r#"
            var m = /(\w)(\d)?-(\w+)/.exec('xx a-bc');
            [m[0], m[1], m[2] === undefined, m[3], m.index, m.input, m.length].join('|')
        "#
        ),
        s("a-bc|a|true|bc|3|xx a-bc|4")
    );
    assert_eq!(eval("/z/.exec('abc')"), JsValue::Null);
}

#[test]
fn test_global_exec_advances_last_index() {
    assert_eq!(
        eval(
            r#"
            var re = /o/g;
            var seen = [];
            var m;
            while ((m = re.exec('foo boo')) !== null) {
                seen.push(m.index + '@' + re.lastIndex);
            }
            seen.join(' ') + ' final=' + re.lastIndex
        "#
        ),
        s("1@2 2@3 5@6 6@7 final=0")
    );
}

#[test]
fn test_non_global_ignores_last_index() {
    assert_eq!(
        eval("var re = /a/; re.lastIndex = 5; re.exec('aaa').index + ':' + re.lastIndex"),
        s("0:5")
    );
}

#[test]
fn test_multiline_anchors() {
    assert_eq!(eval("'one\\ntwo'.match(/^t\\w+/m)[0]"), s("two"));
    assert_eq!(eval("/^two/.test('one\\ntwo')"), JsValue::Boolean(false));
}

#[test]
fn test_constructor() {
    assert_eq!(eval("new RegExp('a+', 'g').global"), JsValue::Boolean(true));
    assert_eq!(eval("RegExp('\\\\d').test('5')"), JsValue::Boolean(true));
    assert_eq!(eval("var r = /x/; RegExp(r) === r"), JsValue::Boolean(true));
    assert_eq!(eval("var r = /x/; new RegExp(r) === r"), JsValue::Boolean(false));
    assert_eq!(eval("new RegExp(/x/g).global"), JsValue::Boolean(true));
    assert_eq!(eval("String(new RegExp(/x/g, 'i'))"), s("/x/i"));
}

#[test]
fn test_invalid_flags_are_syntax_errors() {
    assert!(throws_error("new RegExp('a', 'gg')", "Invalid flags"));
    assert!(throws_error("new RegExp('a', 'q')", "SyntaxError"));
}

#[test]
fn test_invalid_pattern_is_catchable() {
    assert_eq!(
        eval("var r; try { new RegExp('('); } catch (e) { r = e.name; } r"),
        s("SyntaxError")
    );
}

#[test]
fn test_javascript_only_syntax() {
    assert_eq!(eval("/[^]/.test('\\n')"), JsValue::Boolean(true));
    assert_eq!(eval("/a[]/.test('a')"), JsValue::Boolean(false));
    assert_eq!(eval("/\\u0041/.test('A')"), JsValue::Boolean(true));
}

#[test]
fn test_backreference() {
    assert_eq!(eval("/(a)\\1/.test('aa')"), JsValue::Boolean(true));
}

#[test]
fn test_regexp_literal_after_operators() {
    assert_eq!(eval("var x = 4 / 2 / 1; x"), JsValue::Number(2.0));
    assert_eq!(eval("var ok = true && /a/.test('a'); ok"), JsValue::Boolean(true));
    assert_eq!(eval("[/a/, /b/].length"), JsValue::Number(2.0));
}

#[test]
fn test_exec_on_non_regexp_is_type_error() {
    assert!(throws_error("RegExp.prototype.exec.call({}, 'a')", "incompatible receiver"));
}
