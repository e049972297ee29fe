/// Top-left corner that centers a `window`-sized frame on a `screen`-sized
/// display. A window larger than the screen is pinned to the top-left.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn centered_origin(screen: (i32, i32), window: (i32, i32)) -> (i32, i32) {
    (
        ((screen.0 - window.0) / 2).max(0),
        ((screen.1 - window.1) / 2).max(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_on_the_screen() {
        assert_eq!(centered_origin((1920, 1080), (816, 639)), (552, 220));
    }

    #[test]
    fn oversized_window_is_pinned_to_the_corner() {
        assert_eq!(centered_origin((800, 600), (1024, 768)), (0, 0));
        assert_eq!(centered_origin((1920, 600), (816, 768)), (552, 0));
    }
}
