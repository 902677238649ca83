pub mod collect;
pub mod env;
pub mod error;
pub mod launch;
pub mod run;
pub mod slot;
pub mod spec;
pub mod template;

#[cfg(test)]
mod test;
