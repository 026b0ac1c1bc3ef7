//! The program namespace the pair builds up, one merge at a time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::Display;

/// What a top-level definition binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DefinitionKind {
    Function,
    Class,
    Variable,
    Import,
    Statement,
}

/// A single top-level definition and its full source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Bound identifier, or the normalised text of an import or statement.
    pub name: String,
    pub kind: DefinitionKind,
    pub source: String,
}

/// Keyed store of top-level definitions.
///
/// Installing a definition under an existing name replaces it in place, so
/// definitions keep the order in which names first appeared. Nothing is
/// ever removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramStore {
    entries: Vec<Definition>,
    index: HashMap<String, usize>,
}

impl ProgramStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Definitions in first-insertion order.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|d| d.name.as_str())
    }

    /// Install `definition`, returning the one it replaced.
    pub fn install(&mut self, definition: Definition) -> Option<Definition> {
        match self.index.get(&definition.name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i], definition)),
            None => {
                self.index
                    .insert(definition.name.clone(), self.entries.len());
                self.entries.push(definition);
                None
            }
        }
    }

    /// Full program text: imports, then definitions, then bare statements.
    ///
    /// Statements such as the `__main__` guard run last, so they see every
    /// definition no matter which round introduced it.
    pub fn render(&self) -> String {
        let imports = self.sources(|k| k == DefinitionKind::Import);
        let definitions = self.sources(|k| {
            matches!(
                k,
                DefinitionKind::Function | DefinitionKind::Class | DefinitionKind::Variable
            )
        });
        let statements = self.sources(|k| k == DefinitionKind::Statement);

        let sections: Vec<String> = [
            imports.join("\n"),
            definitions.join("\n\n"),
            statements.join("\n\n"),
        ]
        .into_iter()
        .filter(|section| !section.is_empty())
        .collect();
        let mut out = sections.join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn sources(&self, wanted: impl Fn(DefinitionKind) -> bool) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|d| wanted(d.kind))
            .map(|d| d.source.trim_end())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, kind: DefinitionKind, source: &str) -> Definition {
        Definition {
            name: name.to_string(),
            kind,
            source: source.to_string(),
        }
    }

    #[test]
    fn install_replaces_in_place() {
        let mut store = ProgramStore::new();
        store.install(def("f", DefinitionKind::Function, "def f(): return 1"));
        store.install(def("g", DefinitionKind::Function, "def g(): return 2"));

        let old = store.install(def("f", DefinitionKind::Function, "def f(): return 3"));

        assert_eq!(old.unwrap().source, "def f(): return 1");
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["f", "g"]);
        assert_eq!(store.get("f").unwrap().source, "def f(): return 3");
    }

    #[test]
    fn render_hoists_imports() {
        let mut store = ProgramStore::new();
        store.install(def("main", DefinitionKind::Function, "def main():\n    print(os.getcwd())"));
        store.install(def("import os", DefinitionKind::Import, "import os"));

        assert_eq!(
            store.render(),
            "import os\n\ndef main():\n    print(os.getcwd())\n"
        );
    }

    #[test]
    fn statements_render_after_later_definitions() {
        let mut store = ProgramStore::new();
        store.install(def("main", DefinitionKind::Function, "def main():\n    print('v1')"));
        store.install(def(
            "if __name__ == \"__main__\":",
            DefinitionKind::Statement,
            "if __name__ == \"__main__\":\n    main()",
        ));
        store.install(def("helper", DefinitionKind::Function, "def helper():\n    return 3"));
        store.install(def("main", DefinitionKind::Function, "def main():\n    print(helper())"));

        assert_eq!(
            store.render(),
            "def main():\n    print(helper())\n\ndef helper():\n    return 3\n\n\
if __name__ == \"__main__\":\n    main()\n"
        );
    }

    #[test]
    fn empty_store_renders_nothing() {
        assert_eq!(ProgramStore::new().render(), "");
    }
}
