//! Native function bindings, one file per category.
//!
//! Every builtin takes an explicit `&mut Interp` (`value.rs::BuiltinFn`),
//! so registration happens once, directly against the `Interp` being
//! built, with no thread-local interpreter state and no separate help
//! registry — there is no REPL help surface to feed.

mod arithmetic;
mod characters;
mod comparison;
mod control;
mod hashes;
mod io;
mod lists;
mod sequences;
mod sequences_lazy;
mod strings;
mod types;
mod vectors;

use crate::interp::Interp;

pub fn register_all(interp: &mut Interp) {
    arithmetic::register(interp);
    comparison::register(interp);
    types::register(interp);
    lists::register(interp);
    sequences::register(interp);
    strings::register(interp);
    vectors::register(interp);
    hashes::register(interp);
    characters::register(interp);
    sequences_lazy::register(interp);
    io::register(interp);
    control::register(interp);
}
