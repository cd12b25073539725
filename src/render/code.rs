// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Language detection and function discovery for code notes

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of function names listed in a note
pub const MAX_FUNCTIONS: usize = 10;

static JS_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"function\s+(\w+)|const\s+(\w+)\s*=\s*(?:async\s*)?(?:\([^)]*\)\s*=>|function\b)")
        .expect("valid javascript function pattern")
});

static PY_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"def\s+(\w+)\s*\(").expect("valid python function pattern")
});

static JAVA_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:public|private|protected)?\s*(?:static\s+)?\w+\s+(\w+)\s*\(")
        .expect("valid java method pattern")
});

/// Fence language for an extension; unknown extensions pass through
pub fn language_for(extension: &str) -> String {
    let lang = match extension {
        "js" | "jsx" | "mjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "cs" => "csharp",
        "go" => "go",
        "rs" => "rust",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" => "kotlin",
        "scala" => "scala",
        "sh" | "bash" | "zsh" => "bash",
        "lua" => "lua",
        "r" => "r",
        "pl" => "perl",
        "html" | "vue" => "html",
        "css" => "css",
        "scss" => "scss",
        other => other,
    };
    lang.to_string()
}

/// Distinct function names in order of appearance, at most [`MAX_FUNCTIONS`]
pub fn find_functions(content: &str, language: &str) -> Vec<String> {
    let pattern: &Regex = match language {
        "javascript" | "typescript" => &*JS_FUNCTION,
        "python" => &*PY_FUNCTION,
        "java" => &*JAVA_METHOD,
        _ => return Vec::new(),
    };

    let mut names: Vec<String> = Vec::new();
    for caps in pattern.captures_iter(content) {
        let name = caps.iter().skip(1).flatten().next().map(|m| m.as_str());
        if let Some(name) = name {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
                if names.len() >= MAX_FUNCTIONS {
                    break;
                }
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_for() {
        assert_eq!(language_for("py"), "python");
        assert_eq!(language_for("ts"), "typescript");
        assert_eq!(language_for("tsx"), "typescript");
        assert_eq!(language_for("weird"), "weird");
    }

    #[test]
    fn test_python_functions() {
        let src = "def hello():\n    pass\n\ndef world(x):\n    return x\n\ndef hello():\n    pass\n";
        assert_eq!(find_functions(src, "python"), vec!["hello", "world"]);
    }

    #[test]
    fn test_javascript_functions() {
        let src = "function alpha() {}\nconst beta = (a, b) => a + b;\nconst gamma = async () => 1;\nconst delta = function () {};\nconst notFn = 42;\n";
        assert_eq!(find_functions(src, "javascript"), vec!["alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn test_java_methods() {
        let src = "public class A {\n  public static void main(String[] args) {}\n  private int count(int x) { return x; }\n}\n";
        let names = find_functions(src, "java");
        assert!(names.contains(&"main".to_string()));
        assert!(names.contains(&"count".to_string()));
    }

    #[test]
    fn test_function_cap() {
        let src: String = (0..15).map(|i| format!("def f{}():\n    pass\n", i)).collect();
        assert_eq!(find_functions(&src, "python").len(), MAX_FUNCTIONS);
    }

    #[test]
    fn test_unsupported_language() {
        assert!(find_functions("fn main() {}", "rust").is_empty());
    }
}
