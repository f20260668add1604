/*!
 * Command implementations
 */

pub mod keys;
pub mod maintain;
pub mod providers;
pub mod validate;
