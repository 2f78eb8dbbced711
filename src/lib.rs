//! # decamp
//!
//! Converts DataCamp course repositories (chapters, exercises and slide decks
//! written as markdown with embedded metadata) into the markdown dialect of
//! the course-starter site.
//!
//! The work happens in [`decamp::course`], which assembles each chapter with
//! [`decamp::chapter`]; see [`decamp`] for the module map.

pub mod decamp;
