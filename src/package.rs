// ABOUTME: Package module for symbol interning within flat user/system/keyword packages

//! Symbol interning within flat packages.
//!
//! Symbols are interned into one of a small fixed set of flat packages —
//! no nested namespaces, no import/export rules, just a name-to-symbol
//! table per package plus a default `user` package for unqualified reads.

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::SymbolData;

pub const USER_PACKAGE: &str = "user";
pub const SYSTEM_PACKAGE: &str = "sys";
pub const KEYWORD_PACKAGE: &str = "keyword";

pub struct Package {
    pub name: String,
    symbols: HashMap<String, Rc<SymbolData>>,
}

impl Package {
    fn new(name: &str) -> Self {
        Package { name: name.to_string(), symbols: HashMap::new() }
    }

    fn intern(&mut self, name: &str) -> Rc<SymbolData> {
        if let Some(existing) = self.symbols.get(name) {
            return Rc::clone(existing);
        }
        let sym = Rc::new(SymbolData { name: name.to_string(), package: self.name.clone() });
        self.symbols.insert(name.to_string(), Rc::clone(&sym));
        sym
    }

    fn find(&self, name: &str) -> Option<Rc<SymbolData>> {
        self.symbols.get(name).cloned()
    }
}

/// The fixed set of packages (`user_package`, `system_package`,
/// `keyword_package`). Symbols not otherwise package-qualified intern into
/// `user`.
pub struct Packages {
    pub user: Package,
    pub system: Package,
    pub keyword: Package,
}

impl Packages {
    pub fn new() -> Self {
        Packages {
            user: Package::new(USER_PACKAGE),
            system: Package::new(SYSTEM_PACKAGE),
            keyword: Package::new(KEYWORD_PACKAGE),
        }
    }

    fn package_mut(&mut self, name: &str) -> &mut Package {
        match name {
            USER_PACKAGE => &mut self.user,
            SYSTEM_PACKAGE => &mut self.system,
            KEYWORD_PACKAGE => &mut self.keyword,
            _ => &mut self.user,
        }
    }

    /// `intern(name, package-or-nil)`: interns into `user` when no
    /// package is given. A leading `:` selects the keyword package, a
    /// leading `sys:` selects system — this is the reader's job
    /// (`parser.rs`) to strip before calling in; `intern` itself takes the
    /// already-resolved package name.
    pub fn intern(&mut self, name: &str, package: Option<&str>) -> Rc<SymbolData> {
        self.package_mut(package.unwrap_or(USER_PACKAGE)).intern(name)
    }

    pub fn intern_keyword(&mut self, name: &str) -> Rc<SymbolData> {
        self.keyword.intern(name)
    }

    pub fn intern_system(&mut self, name: &str) -> Rc<SymbolData> {
        self.system.intern(name)
    }

    pub fn find(&self, name: &str, package: Option<&str>) -> Option<Rc<SymbolData>> {
        match package.unwrap_or(USER_PACKAGE) {
            USER_PACKAGE => self.user.find(name),
            SYSTEM_PACKAGE => self.system.find(name),
            KEYWORD_PACKAGE => self.keyword.find(name),
            _ => self.user.find(name),
        }
    }
}

impl Default for Packages {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_name_returns_same_identity() {
        let mut pkgs = Packages::new();
        let a = pkgs.intern("foo", None);
        let b = pkgs.intern("foo", None);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_packages_are_distinct_symbols() {
        let mut pkgs = Packages::new();
        let a = pkgs.intern("foo", None);
        let b = pkgs.intern_system("foo");
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(a.package, USER_PACKAGE);
        assert_eq!(b.package, SYSTEM_PACKAGE);
    }

    #[test]
    fn keyword_package_is_distinguished() {
        let mut pkgs = Packages::new();
        let k = pkgs.intern_keyword("foo");
        assert_eq!(k.package, KEYWORD_PACKAGE);
    }
}
