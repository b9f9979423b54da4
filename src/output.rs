// Copyright 2017-2021 Lukas Pustina <lukas@pustina.de>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use yansi::{Color, Style};

pub static ATTENTION: Style = Style::new().fg(Color::Yellow).bold();
pub static ERROR: Style = Style::new().fg(Color::Red).bold();
pub static EMPH: Style = Style::new().bold();

pub static ATTENTION_PREFIX: &str = "⚠︎";
pub static CAPTION_PREFIX: &str = "▶︎";
pub static ERROR_PREFIX: &str = "⚡︎";
pub static INFO_PREFIX: &str = "▸";

pub fn no_color_mode() {
    yansi::disable();
}
