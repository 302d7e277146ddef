//! Array tests: literals, length, native methods and the interpreted polyfills

use super::{eval, s, throws_error};
use stepjs::JsValue;

#[test]
fn test_array_literal_and_length() {
    assert_eq!(eval("[1, 2, 3].length"), JsValue::Number(3.0));
    assert_eq!(eval("[].length"), JsValue::Number(0.0));
    assert_eq!(eval("[1, , 3].length"), JsValue::Number(3.0));
    assert_eq!(eval("1 in [1, , 3]"), JsValue::Boolean(false));
    assert_eq!(eval("[1, 2, ].length"), JsValue::Number(2.0));
}

#[test]
fn test_index_write_extends_length() {
    assert_eq!(eval("var a = []; a[4] = 'x'; a.length"), JsValue::Number(5.0));
}

#[test]
fn test_length_write_truncates() {
    assert_eq!(eval("var a = [1, 2, 3, 4]; a.length = 2; a.join(',')"), s("1,2"));
    assert_eq!(eval("var a = [1, 2, 3]; a.length = 2; a[2]"), JsValue::Undefined);
    assert!(throws_error("var a = []; a.length = -1", "Invalid array length"));
}

#[test]
fn test_array_constructor() {
    assert_eq!(eval("new Array(3).length"), JsValue::Number(3.0));
    assert_eq!(eval("Array(1, 2, 3).join('-')"), s("1-2-3"));
    assert_eq!(eval("new Array('3').length"), JsValue::Number(1.0));
    assert!(throws_error("new Array(1.5)", "Invalid array length"));
}

#[test]
fn test_is_array() {
    assert_eq!(eval("Array.isArray([])"), JsValue::Boolean(true));
    assert_eq!(eval("Array.isArray({length: 0})"), JsValue::Boolean(false));
}

#[test]
fn test_push_and_pop() {
    assert_eq!(eval("var a = [1]; a.push(2, 3)"), JsValue::Number(3.0));
    assert_eq!(eval("var a = [1, 2]; a.pop() + ':' + a.length"), s("2:1"));
    assert_eq!(eval("[].pop()"), JsValue::Undefined);
}

#[test]
fn test_shift_and_unshift() {
    assert_eq!(eval("var a = [1, 2, 3]; a.shift() + ':' + a.join(',')"), s("1:2,3"));
    assert_eq!(eval("var a = [3]; a.unshift(1, 2) + ':' + a.join(',')"), s("3:1,2,3"));
}

#[test]
fn test_splice() {
    assert_eq!(
        eval("var a = [1, 2, 3, 4, 5]; var r = a.splice(1, 2, 'x'); r.join(',') + '|' + a.join(',')"),
        s("2,3|1,x,4,5")
    );
    assert_eq!(
        eval("var a = [1, 2, 3]; a.splice(-1); a.join(',')"),
        s("1,2")
    );
    assert_eq!(
        eval("var a = [1, 2, 3]; a.splice(1, 0, 'a', 'b'); a.join(',')"),
        s("1,a,b,2,3")
    );
}

#[test]
fn test_slice() {
    assert_eq!(eval("[1, 2, 3, 4].slice(1, 3).join(',')"), s("2,3"));
    assert_eq!(eval("[1, 2, 3, 4].slice(-2).join(',')"), s("3,4"));
    assert_eq!(eval("var a = [1, 2]; var b = a.slice(); b.push(3); a.length"), JsValue::Number(2.0));
}

#[test]
fn test_join_and_to_string() {
    assert_eq!(eval("[1, null, undefined, 'x'].join('|')"), s("1|||x"));
    assert_eq!(eval("[1, [2, [3]]].toString()"), s("1,2,3"));
    assert_eq!(eval("var a = [1]; a.push(a); a.join(',')"), s("1,"));
}

#[test]
fn test_concat() {
    assert_eq!(eval("[1].concat([2, 3], 4, [[5]]).length"), JsValue::Number(5.0));
    assert_eq!(eval("[1].concat([2, 3], 4).join(',')"), s("1,2,3,4"));
}

#[test]
fn test_index_of_and_last_index_of() {
    assert_eq!(eval("[1, 2, 3, 2].indexOf(2)"), JsValue::Number(1.0));
    assert_eq!(eval("[1, 2, 3, 2].lastIndexOf(2)"), JsValue::Number(3.0));
    assert_eq!(eval("[1, 2, 3].indexOf('2')"), JsValue::Number(-1.0));
    assert_eq!(eval("[1, 2, 1].indexOf(1, 1)"), JsValue::Number(2.0));
    assert_eq!(eval("[NaN].indexOf(NaN)"), JsValue::Number(-1.0));
}

#[test]
fn test_reverse() {
    assert_eq!(eval("[1, 2, 3].reverse().join(',')"), s("3,2,1"));
}

#[test]
fn test_default_sort_is_by_string() {
    assert_eq!(eval("[10, 9, 1, 100].sort().join(',')"), s("1,10,100,9"));
    assert_eq!(eval("['b', undefined, 'a'].sort().join(',')"), s("a,b,"));
}

#[test]
fn test_sort_with_comparator() {
    assert_eq!(
        eval("[10, 9, 1, 100].sort(function(a, b) { return a - b; }).join(',')"),
        s("1,9,10,100")
    );
}

#[test]
fn test_sort_with_comparator_is_stable() {
    assert_eq!(
        eval(
            r#"
            var people = [{n: 'a', age: 30}, {n: 'b', age: 20}, {n: 'c', age: 30}, {n: 'd', age: 20}];
            people.sort(function(x, y) { return x.age - y.age; });
            people.map(function(p) { return p.n; }).join('')
        "#
        ),
        s("bdac")
    );
}

#[test]
fn test_for_each() {
    assert_eq!(
        eval("var total = 0; [1, 2, 3].forEach(function(v, i) { total += v * i; }); total"),
        JsValue::Number(8.0)
    );
}

#[test]
fn test_for_each_skips_holes() {
    assert_eq!(
        eval("var calls = 0; [1, , 3].forEach(function() { calls++; }); calls"),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_map_and_filter() {
    assert_eq!(eval("[1, 2, 3].map(function(x) { return x * 2; }).join(',')"), s("2,4,6"));
    assert_eq!(
        eval("[1, 2, 3, 4].filter(function(x) { return x % 2 === 0; }).join(',')"),
        s("2,4")
    );
}

#[test]
fn test_map_uses_this_arg() {
    assert_eq!(
        eval("[1, 2].map(function(x) { return x + this.offset; }, {offset: 10}).join(',')"),
        s("11,12")
    );
}

#[test]
fn test_some_and_every() {
    assert_eq!(eval("[1, 2, 3].some(function(x) { return x > 2; })"), JsValue::Boolean(true));
    assert_eq!(eval("[1, 2, 3].every(function(x) { return x > 2; })"), JsValue::Boolean(false));
    assert_eq!(eval("[].every(function() { return false; })"), JsValue::Boolean(true));
}

#[test]
fn test_reduce_and_reduce_right() {
    assert_eq!(eval("[1, 2, 3, 4].reduce(function(a, b) { return a + b; })"), JsValue::Number(10.0));
    assert_eq!(eval("[1, 2, 3].reduce(function(a, b) { return a + b; }, 10)"), JsValue::Number(16.0));
    assert_eq!(
        eval("['a', 'b', 'c'].reduceRight(function(a, b) { return a + b; })"),
        s("cba")
    );
}

#[test]
fn test_reduce_of_empty_array_is_type_error() {
    assert!(throws_error(
        "[].reduce(function(a, b) { return a + b; })",
        "Reduce of empty array with no initial value"
    ));
}

#[test]
fn test_callback_must_be_function() {
    assert!(throws_error("[1].forEach('nope')", "nope is not a function"));
}

#[test]
fn test_polyfill_methods_are_not_enumerable() {
    assert_eq!(eval("var n = 0; for (var k in []) n++; n"), JsValue::Number(0.0));
}

#[test]
fn test_generic_methods_on_array_likes() {
    assert_eq!(
        eval("Array.prototype.join.call({length: 2, 0: 'a', 1: 'b'}, '+')"),
        s("a+b")
    );
    assert_eq!(
        eval("function f() { return Array.prototype.slice.call(arguments, 1).join(','); } f(1, 2, 3)"),
        s("2,3")
    );
}

#[test]
fn test_push_past_max_length_is_range_error() {
    assert_eq!(
        eval(
            "var a = []; a.length = 4294967295; var r;
             try { a.push(1); } catch (e) { r = e.name + ': ' + e.message; }
             r + ' ' + a.length + ' ' + (4294967295 in a)"
        ),
        s("RangeError: Invalid array length 4294967295 false")
    );
    assert_eq!(
        eval("var a = []; a.length = 4294967294; a.push('last')"),
        JsValue::Number(4294967295.0)
    );
}

#[test]
fn test_unshift_past_max_length_is_range_error() {
    assert_eq!(
        eval(
            "var a = []; a.length = 4294967295; var r;
             try { a.unshift(0); } catch (e) { r = e.name; }
             r + ' ' + a.length"
        ),
        s("RangeError 4294967295")
    );
}

#[test]
fn test_deeply_nested_array_to_string_is_range_error() {
    let program = "var a = []; for (var i = 0; i < 20000; i++) a = [a]; var r = [];
        try { String(a); } catch (e) { r.push(e.name); }
        try { a + ''; } catch (e) { r.push(e.name); }
        try { a.join(); } catch (e) { r.push(e.message); }
        r.join()";
    assert_eq!(eval(program), s("RangeError,RangeError,Maximum nesting depth exceeded"));
    // Moderate nesting still converts
    assert_eq!(eval("var a = [1]; for (var i = 0; i < 100; i++) a = [a]; String(a)"), s("1"));
}
