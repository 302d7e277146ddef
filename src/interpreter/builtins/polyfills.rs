//! Builtins written in the guest language.
//!
//! Methods that call back into guest functions live here rather than in Rust
//! so the callbacks run on the frame stack like any other guest code and
//! remain interruptible between steps.

/// Installed once per interpreter after the native builtins, when
/// `InterpreterConfig::polyfills` is on.
pub const POLYFILLS: &str = r#"
(function() {
  var define = function(target, name, value) {
    Object.defineProperty(target, name, {writable: true, value: value});
  };
  var requireFunction = function(callback) {
    if (typeof callback !== 'function') {
      throw TypeError(callback + ' is not a function');
    }
  };

  var nativeSort = Array.prototype.sort;
  define(Array.prototype, 'sort', function(comparefn) {
    if (typeof comparefn !== 'function') {
      return nativeSort.call(this);
    }
    var len = this.length >>> 0;
    var values = [];
    var undefs = 0;
    for (var i = 0; i < len; i++) {
      if (i in this) {
        if (this[i] === undefined) {
          undefs++;
        } else {
          values.push(this[i]);
        }
      }
    }
    // Insertion sort keeps equal elements in order
    for (var j = 1; j < values.length; j++) {
      var item = values[j];
      var k = j - 1;
      while (k >= 0 && comparefn(values[k], item) > 0) {
        values[k + 1] = values[k];
        k--;
      }
      values[k + 1] = item;
    }
    var n = 0;
    for (; n < values.length; n++) {
      this[n] = values[n];
    }
    for (var u = 0; u < undefs; u++) {
      this[n++] = undefined;
    }
    for (; n < len; n++) {
      delete this[n];
    }
    return this;
  });

  define(Array.prototype, 'forEach', function(callback, thisArg) {
    requireFunction(callback);
    var len = this.length >>> 0;
    for (var i = 0; i < len; i++) {
      if (i in this) {
        callback.call(thisArg, this[i], i, this);
      }
    }
  });

  define(Array.prototype, 'map', function(callback, thisArg) {
    requireFunction(callback);
    var len = this.length >>> 0;
    var result = new Array(len);
    for (var i = 0; i < len; i++) {
      if (i in this) {
        result[i] = callback.call(thisArg, this[i], i, this);
      }
    }
    return result;
  });

  define(Array.prototype, 'filter', function(callback, thisArg) {
    requireFunction(callback);
    var len = this.length >>> 0;
    var result = [];
    for (var i = 0; i < len; i++) {
      if (i in this) {
        var value = this[i];
        if (callback.call(thisArg, value, i, this)) {
          result.push(value);
        }
      }
    }
    return result;
  });

  define(Array.prototype, 'some', function(callback, thisArg) {
    requireFunction(callback);
    var len = this.length >>> 0;
    for (var i = 0; i < len; i++) {
      if (i in this && callback.call(thisArg, this[i], i, this)) {
        return true;
      }
    }
    return false;
  });

  define(Array.prototype, 'every', function(callback, thisArg) {
    requireFunction(callback);
    var len = this.length >>> 0;
    for (var i = 0; i < len; i++) {
      if (i in this && !callback.call(thisArg, this[i], i, this)) {
        return false;
      }
    }
    return true;
  });

  define(Array.prototype, 'reduce', function(callback) {
    requireFunction(callback);
    var len = this.length >>> 0;
    var i = 0;
    var accumulator;
    if (arguments.length >= 2) {
      accumulator = arguments[1];
    } else {
      while (i < len && !(i in this)) {
        i++;
      }
      if (i >= len) {
        throw TypeError('Reduce of empty array with no initial value');
      }
      accumulator = this[i++];
    }
    for (; i < len; i++) {
      if (i in this) {
        accumulator = callback(accumulator, this[i], i, this);
      }
    }
    return accumulator;
  });

  define(Array.prototype, 'reduceRight', function(callback) {
    requireFunction(callback);
    var len = this.length >>> 0;
    var i = len - 1;
    var accumulator;
    if (arguments.length >= 2) {
      accumulator = arguments[1];
    } else {
      while (i >= 0 && !(i in this)) {
        i--;
      }
      if (i < 0) {
        throw TypeError('Reduce of empty array with no initial value');
      }
      accumulator = this[i--];
    }
    for (; i >= 0; i--) {
      if (i in this) {
        accumulator = callback(accumulator, this[i], i, this);
      }
    }
    return accumulator;
  });

  var nativeReplace = String.prototype.replace;
  define(String.prototype, 'replace', function(pattern, replacement) {
    if (typeof replacement !== 'function') {
      return nativeReplace.call(this, pattern, replacement);
    }
    var str = String(this);
    if (pattern instanceof RegExp) {
      var global = pattern.global;
      var out = '';
      var last = 0;
      var m;
      if (global) {
        pattern.lastIndex = 0;
      }
      while ((m = pattern.exec(str)) !== null) {
        var args = m.slice();
        args.push(m.index, str);
        out += str.substring(last, m.index) + replacement.apply(undefined, args);
        last = m.index + m[0].length;
        if (!global) {
          break;
        }
        if (m[0].length === 0) {
          pattern.lastIndex++;
        }
      }
      if (global) {
        pattern.lastIndex = 0;
      }
      return out + str.substring(last);
    }
    pattern = String(pattern);
    var at = str.indexOf(pattern);
    if (at === -1) {
      return str;
    }
    return str.substring(0, at) + replacement(pattern, at, str) +
        str.substring(at + pattern.length);
  });
})();
"#;
