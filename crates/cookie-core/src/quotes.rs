//! Flavor text shown with each successful click.

pub const COOKIE_QUOTES: &[&str] = &[
    "C is for cookie, and cookie is for me.",
    "Home is here heart is. Heart where cookie is. Math clear: home is cookie.",
    "Sometimes me think, what is friend? And then me say: a friend is someone to share last cookie with.",
    "Chocolate chip important to me... It mean whole lot to me... Om nom nom nom.",
    "Fruit... or Cookie... Fruit... Cookie... Me Cookie Monster! This No-Brainer!",
    "Me love poetry... and cookies!",
    "Today me will live in the moment, unless it's unpleasant in which case me will eat a cookie.",
    "I'd give you another cookie, but I ate it.",
    "Me Love to Eat Cookies. Sometimes eat whole, sometimes me chew it.",
    "Keep Calm & Eat Cookies.",
    "No get upset, okay? Don't get excited. Me not fussy - just give me box of cookies.",
    "Me lost me cookie at the disco.",
    "Me just met you and this is crazy, but you got cookie, so share it maybe?",
    "Me no cry because cookie is finished. Me smile because cookie happened!",
    "Early bird gets the worm. But cookie taste better than worm. So me sleep in.",
    "Cookie is like high five for stomach.",
];

/// Jar summary for a balance, by tier.
pub fn jar_line(mention: &str, cookies: &str, is_zero: bool, is_small: bool) -> String {
    if is_zero {
        format!("{mention} no have any cookie!")
    } else if is_small {
        format!("{mention} has {cookies} cookies! not many cookie but better than no cookie!!")
    } else {
        format!("{mention} has {cookies} cookies!! So many! om nom nom nom")
    }
}
