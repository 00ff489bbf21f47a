#![allow(dead_code)]

pub mod decorators;
pub mod pages;
