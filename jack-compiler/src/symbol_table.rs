//! Two-scope symbol table: class scope (static/field) overlaid by
//! subroutine scope (argument/local), matching the course's reference
//! implementation's plain-dictionary semantics — `define` on a name
//! already present in the active scope simply overwrites it.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Arg,
    Var,
}

#[derive(Debug, Clone)]
struct Entry {
    type_name: String,
    kind: Kind,
    index: u16,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Entry>,
    subroutine_scope: HashMap<String, Entry>,
    static_count: u16,
    field_count: u16,
    arg_count: u16,
    var_count: u16,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears subroutine-scope symbols and resets the `Arg`/`Var` counters.
    /// Class-scope symbols (`Static`/`Field`) persist across subroutines.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.arg_count = 0;
        self.var_count = 0;
    }

    pub fn define(&mut self, name: &str, type_name: &str, kind: Kind) {
        let index = self.var_count(kind);
        let entry = Entry {
            type_name: type_name.to_string(),
            kind,
            index,
        };

        match kind {
            Kind::Static | Kind::Field => {
                self.class_scope.insert(name.to_string(), entry);
            }
            Kind::Arg | Kind::Var => {
                self.subroutine_scope.insert(name.to_string(), entry);
            }
        }

        match kind {
            Kind::Static => self.static_count += 1,
            Kind::Field => self.field_count += 1,
            Kind::Arg => self.arg_count += 1,
            Kind::Var => self.var_count += 1,
        }
    }

    #[must_use]
    pub fn var_count(&self, kind: Kind) -> u16 {
        match kind {
            Kind::Static => self.static_count,
            Kind::Field => self.field_count,
            Kind::Arg => self.arg_count,
            Kind::Var => self.var_count,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Entry> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|e| e.kind)
    }

    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|e| e.type_name.as_str())
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|e| e.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_monotonic_per_kind() {
        let mut st = SymbolTable::new();
        st.define("a", "int", Kind::Field);
        st.define("b", "int", Kind::Field);
        st.define("c", "boolean", Kind::Static);

        assert_eq!(st.index_of("a"), Some(0));
        assert_eq!(st.index_of("b"), Some(1));
        assert_eq!(st.index_of("c"), Some(0));
        assert_eq!(st.var_count(Kind::Field), 2);
        assert_eq!(st.var_count(Kind::Static), 1);
    }

    #[test]
    fn subroutine_scope_shadows_class_scope() {
        let mut st = SymbolTable::new();
        st.define("x", "int", Kind::Field);
        st.define("x", "int", Kind::Var);

        assert_eq!(st.kind_of("x"), Some(Kind::Var));
        assert_eq!(st.index_of("x"), Some(0));
    }

    #[test]
    fn start_subroutine_clears_only_subroutine_scope() {
        let mut st = SymbolTable::new();
        st.define("field1", "int", Kind::Field);
        st.define("arg1", "int", Kind::Arg);
        st.define("local1", "int", Kind::Var);

        st.start_subroutine();

        assert_eq!(st.kind_of("field1"), Some(Kind::Field));
        assert_eq!(st.kind_of("arg1"), None);
        assert_eq!(st.kind_of("local1"), None);
        assert_eq!(st.var_count(Kind::Arg), 0);
        assert_eq!(st.var_count(Kind::Var), 0);
        assert_eq!(st.var_count(Kind::Field), 1);
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let st = SymbolTable::new();
        assert_eq!(st.kind_of("missing"), None);
        assert_eq!(st.type_of("missing"), None);
        assert_eq!(st.index_of("missing"), None);
    }
}
