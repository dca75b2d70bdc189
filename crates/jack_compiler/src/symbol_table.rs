//! Two-level scope mapping names to (type, kind, index).
//!
//! The class scope holds `static` and `field` declarations and lives for one
//! compilation unit.  The subroutine scope holds arguments and locals and is
//! cleared at the start of each subroutine.

use jack_vm::Segment;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    /// The segment a variable of this kind resolves to.
    pub fn segment(&self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: String,
    pub kind: Kind,
    pub index: u16,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
    static_count: u16,
    field_count: u16,
    argument_count: u16,
    local_count: u16,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines `name` in the scope implied by `kind`, assigning the next
    /// index for that kind.  Returns `None` if the name is already taken in
    /// that scope.
    pub fn define(&mut self, name: &str, ty: &str, kind: Kind) -> Option<u16> {
        let (scope, counter) = match kind {
            Kind::Static => (&mut self.class_scope, &mut self.static_count),
            Kind::Field => (&mut self.class_scope, &mut self.field_count),
            Kind::Argument => (&mut self.subroutine_scope, &mut self.argument_count),
            Kind::Local => (&mut self.subroutine_scope, &mut self.local_count),
        };

        if scope.contains_key(name) {
            return None;
        }

        let index = *counter;
        *counter += 1;

        scope.insert(
            name.to_owned(),
            Symbol {
                name: name.to_owned(),
                ty: ty.to_owned(),
                kind,
                index,
            },
        );

        Some(index)
    }

    /// Looks `name` up in the subroutine scope first, then the class scope.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn var_count(&self, kind: Kind) -> u16 {
        match kind {
            Kind::Static => self.static_count,
            Kind::Field => self.field_count,
            Kind::Argument => self.argument_count,
            Kind::Local => self.local_count,
        }
    }

    /// Clears the subroutine scope and its counters.  Called on entry to
    /// every subroutine.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.argument_count = 0;
        self.local_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn per_kind_indices_in_declaration_order() {
        let mut table = SymbolTable::new();
        table.define("a", "int", Kind::Static).unwrap();
        table.define("b", "int", Kind::Field).unwrap();
        table.define("c", "int", Kind::Static).unwrap();
        table.define("d", "int", Kind::Field).unwrap();
        table.define("e", "int", Kind::Field).unwrap();

        assert_eq!(table.resolve("a").unwrap().index, 0);
        assert_eq!(table.resolve("c").unwrap().index, 1);
        assert_eq!(table.resolve("b").unwrap().index, 0);
        assert_eq!(table.resolve("d").unwrap().index, 1);
        assert_eq!(table.resolve("e").unwrap().index, 2);
        assert_eq!(table.var_count(Kind::Static), 2);
        assert_eq!(table.var_count(Kind::Field), 3);
    }

    #[test]
    fn subroutine_scope_shadows_class_scope() {
        let mut table = SymbolTable::new();
        table.define("x", "int", Kind::Field).unwrap();
        table.define("x", "boolean", Kind::Local).unwrap();

        let symbol = table.resolve("x").unwrap();
        assert_eq!(symbol.kind, Kind::Local);
        assert_eq!(symbol.ty, "boolean");

        table.start_subroutine();
        assert_eq!(table.resolve("x").unwrap().kind, Kind::Field);
    }

    #[test]
    fn start_subroutine_resets_counters() {
        let mut table = SymbolTable::new();
        table.define("this", "Point", Kind::Argument).unwrap();
        table.define("dx", "int", Kind::Argument).unwrap();
        table.define("t", "int", Kind::Local).unwrap();
        assert_eq!(table.var_count(Kind::Argument), 2);

        table.start_subroutine();
        assert_eq!(table.var_count(Kind::Argument), 0);
        assert_eq!(table.var_count(Kind::Local), 0);
        assert_eq!(table.define("other", "int", Kind::Argument), Some(0));
    }

    #[test]
    fn duplicate_names_are_rejected_per_scope() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("x", "int", Kind::Field), Some(0));
        assert_eq!(table.define("x", "int", Kind::Static), None);
        // The same name in the other scope is shadowing, not redefinition.
        assert_eq!(table.define("x", "int", Kind::Local), Some(0));
        assert_eq!(table.define("x", "int", Kind::Argument), None);
    }

    #[test]
    fn kind_to_segment_mapping() {
        assert_eq!(Kind::Static.segment(), Segment::Static);
        assert_eq!(Kind::Field.segment(), Segment::This);
        assert_eq!(Kind::Argument.segment(), Segment::Argument);
        assert_eq!(Kind::Local.segment(), Segment::Local);
    }
}
