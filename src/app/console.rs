// Copyright 2017-2021 Lukas Pustina <lukas@pustina.de>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::fmt;

use yansi::{Painted, Style};

use crate::output::{ATTENTION, ATTENTION_PREFIX, CAPTION_PREFIX, EMPH, ERROR, ERROR_PREFIX, INFO_PREFIX};

/// Writes the application chrome: captions, progress notes, errors.
#[derive(Debug, Default)]
pub struct Console {}

impl Console {
    pub fn new() -> Console {
        Console {}
    }

    pub fn caption<T: AsRef<str>>(&self, str: T) {
        println!("{} {}", Fmt::emph(CAPTION_PREFIX), Fmt::emph(str.as_ref()));
    }

    pub fn info<T: AsRef<str>>(&self, str: T) {
        println!("{} {}", INFO_PREFIX, str.as_ref());
    }

    pub fn attention<T: AsRef<str>>(&self, str: T) {
        println!("{} {}", Fmt::attention(ATTENTION_PREFIX), str.as_ref());
    }

    pub fn error<T: AsRef<str>>(&self, str: T) {
        eprintln!("{} {}", Fmt::error(ERROR_PREFIX), str.as_ref());
    }
}

pub struct Fmt {}

impl Fmt {
    pub fn emph<T: fmt::Display>(item: T) -> Painted<T> {
        Fmt::styled(item, EMPH)
    }

    pub fn attention<T: fmt::Display>(item: T) -> Painted<T> {
        Fmt::styled(item, ATTENTION)
    }

    pub fn error<T: fmt::Display>(item: T) -> Painted<T> {
        Fmt::styled(item, ERROR)
    }

    fn styled<T: fmt::Display>(item: T, style: Style) -> Painted<T> {
        let mut painted = Painted::new(item);
        painted.style = style;
        painted
    }
}
