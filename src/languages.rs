use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const DEFAULT_LANGUAGE: &str = "python";
pub const PLAINTEXT: &str = "plaintext";

/// A language a project can be started in.
#[derive(Debug)]
pub struct Language {
    pub tag: &'static str,
    pub name: &'static str,
    /// Name of the file created together with a new project.
    pub filename: &'static str,
    pub extensions: &'static [&'static str],
    pub starter: &'static str,
}

pub static LANGUAGES: &[Language] = &[
    Language {
        tag: "python",
        name: "Python",
        filename: "main.py",
        extensions: &["py", "pyw"],
        starter: "def main():\n    print(\"Hello, World!\")\n\n\nif __name__ == \"__main__\":\n    main()\n",
    },
    Language {
        tag: "javascript",
        name: "JavaScript",
        filename: "script.js",
        extensions: &["js", "mjs", "cjs"],
        starter: "function main() {\n    console.log(\"Hello, World!\");\n}\n\nmain();\n",
    },
    Language {
        tag: "typescript",
        name: "TypeScript",
        filename: "index.ts",
        extensions: &["ts", "tsx"],
        starter: "function greet(name: string): string {\n    return `Hello, ${name}!`;\n}\n\nconsole.log(greet(\"World\"));\n",
    },
    Language {
        tag: "html",
        name: "HTML",
        filename: "index.html",
        extensions: &["html", "htm"],
        starter: "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    <title>My Page</title>\n</head>\n<body>\n    <h1>Hello, World!</h1>\n</body>\n</html>\n",
    },
    Language {
        tag: "css",
        name: "CSS",
        filename: "style.css",
        extensions: &["css"],
        starter: "body {\n    font-family: sans-serif;\n    margin: 0;\n    padding: 1rem;\n}\n",
    },
    Language {
        tag: "java",
        name: "Java",
        filename: "Main.java",
        extensions: &["java"],
        starter: "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}\n",
    },
    Language {
        tag: "cpp",
        name: "C++",
        filename: "main.cpp",
        extensions: &["cpp", "cc", "cxx", "hpp", "hh"],
        starter: "#include <iostream>\n\nint main() {\n    std::cout << \"Hello, World!\" << std::endl;\n    return 0;\n}\n",
    },
    Language {
        tag: "c",
        name: "C",
        filename: "main.c",
        extensions: &["c", "h"],
        starter: "#include <stdio.h>\n\nint main(void) {\n    printf(\"Hello, World!\\n\");\n    return 0;\n}\n",
    },
    Language {
        tag: "rust",
        name: "Rust",
        filename: "main.rs",
        extensions: &["rs"],
        starter: "fn main() {\n    println!(\"Hello, World!\");\n}\n",
    },
    Language {
        tag: "go",
        name: "Go",
        filename: "main.go",
        extensions: &["go"],
        starter: "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"Hello, World!\")\n}\n",
    },
    Language {
        tag: PLAINTEXT,
        name: "Plain text",
        filename: "notes.txt",
        extensions: &["txt", "md"],
        starter: "",
    },
];

static BY_EXTENSION: Lazy<HashMap<&'static str, &'static Language>> = Lazy::new(|| {
    LANGUAGES
        .iter()
        .flat_map(|lang| lang.extensions.iter().map(move |ext| (*ext, lang)))
        .collect()
});

pub fn find(tag: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|lang| lang.tag == tag)
}

/// Language tag for a filename, judged by its extension.
pub fn detect(filename: &str) -> &'static str {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .and_then(|ext| BY_EXTENSION.get(ext.as_str()).map(|lang| lang.tag))
        .unwrap_or(PLAINTEXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(detect("app.py"), "python");
        assert_eq!(detect("Main.JAVA"), "java");
        assert_eq!(detect("lib/util.rs"), "rust");
        assert_eq!(detect("index.htm"), "html");
        assert_eq!(detect("Makefile"), PLAINTEXT);
        assert_eq!(detect("archive.tar.gz"), PLAINTEXT);
    }

    #[test]
    fn every_language_detects_its_own_starter_file() {
        for lang in LANGUAGES {
            assert_eq!(detect(lang.filename), lang.tag, "{}", lang.filename);
        }
    }

    #[test]
    fn default_language_is_known() {
        let python = find(DEFAULT_LANGUAGE).unwrap();
        assert!(python.starter.contains("Hello, World!"));
        assert!(find("cobol").is_none());
    }
}
