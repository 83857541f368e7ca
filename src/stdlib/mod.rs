// Built-in functions for the template language

pub mod colors;
pub mod format;

mod interface;
mod io;
mod math;
mod string;
mod tools;

use crate::eval::Interpreter;

/// Register every built-in into an interpreter.
pub fn register_all(interp: &mut Interpreter<'_>) {
    interface::register(interp);
    io::register(interp);
    string::register(interp);
    math::register(interp);
    tools::register(interp);
}
