use crate::quadtree::Aabb;
use crate::quadtree::NodeRef;
use crate::quadtree::Point;
use crate::quadtree::Square;

/// Hex values of braille dots
///
/// ```text
///  1   8
///  2  10
///  4  20
/// 40  80
/// ```
///
/// Where the base blank pattern is codepoint `0x2800` (or U+2800)
///
/// To get other configurations, just add the numbers above.
const BRAILLE_EMPTY: u32 = 0x2800;

pub struct Camera {
    /// The pixel buffer
    pb: Vec<bool>,

    /// The frame buffer.
    fb: String,

    /// Codepoints. This allows us to construct the framebuffer more easily
    cp: Vec<u32>,

    /// Width of the framebuffer, in pixels
    w: usize,

    /// Height of the framebuffer, in pixels
    h: usize,
}

impl Camera {
    pub fn new(w: usize, h: usize) -> Self {
        // For each braille character, we need 3 bytes:
        //  - The leader byte:     0b11100010
        //  - Continuation byte 1: 0b101000xx
        //  - Continuation byte 2: 0b10xxxxxx
        // For each newline, we need one byte: 0b00001010
        //
        // Let `w` and `h` refer to width and height of the pixel buffer. Then `bw = ceil(w / 2)`
        // and `bh = ceil(h / 4)` are the width and height of braille characters of our framebuffer
        // (that is, not accounting for the trailing newlines expected at the end of each line).

        let (bw, bh) = (w.div_ceil(2), h.div_ceil(4));

        let mut cam = Self {
            pb: vec![false; w * h],
            fb: String::with_capacity(3 * (bw * bh) + bh),
            cp: vec![BRAILLE_EMPTY; bw * bh],
            w,
            h,
        };

        cam.render();
        cam
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        *self = Self::new(w, h);
    }

    /// Turns on a single pixel of the framebuffer. Pixels outside the frame are ignored.
    pub fn draw_pixel(&mut self, x: i64, y: i64) {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return;
        }

        let i = self.xy_from(x as usize, y as usize);
        self.pb[i] = true;
    }

    pub fn draw_hline(&mut self, x0: i64, x1: i64, y: i64) {
        let (x0, x1) = (x0.min(x1).max(0), x0.max(x1).min(self.w as i64 - 1));

        for x in x0..=x1 {
            self.draw_pixel(x, y);
        }
    }

    pub fn draw_vline(&mut self, x: i64, y0: i64, y1: i64) {
        let (y0, y1) = (y0.min(y1).max(0), y0.max(y1).min(self.h as i64 - 1));

        for y in y0..=y1 {
            self.draw_pixel(x, y);
        }
    }

    /// Outline of the pixel rectangle spanned by two corners
    pub fn draw_rect(&mut self, (x0, y0): (i64, i64), (x1, y1): (i64, i64)) {
        self.draw_hline(x0, x1, y0);
        self.draw_hline(x0, x1, y1);
        self.draw_vline(x0, y0, y1);
        self.draw_vline(x1, y0, y1);
    }

    /// A small plus sign
    pub fn draw_cross(&mut self, x: i64, y: i64) {
        self.draw_hline(x - 1, x + 1, y);
        self.draw_vline(x, y - 1, y + 1);
    }

    /// Reset the pixel buffer
    pub fn reset(&mut self) {
        self.pb.fill(false);
    }

    /// Fundamentally, we have a framebuffer of every pixel on our screen, and we ask ourselves "Is
    /// this pixel on or off?".
    pub fn render(&mut self) -> &str {
        let bw = self.w.div_ceil(2);

        // compute new codepoints
        self.cp.fill(BRAILLE_EMPTY);

        for (n, &px) in self.pb.iter().enumerate() {
            let (x, y) = (n % self.w, n / self.w);

            if px {
                self.cp[(y / 4) * bw + (x / 2)] += Self::get_hex_value(x, y);
            }
        }

        self.fb.clear();

        for (i, &c) in self.cp.iter().enumerate() {
            if i > 0 && i % bw == 0 {
                self.fb.push('\n');
            }

            // every sum of dot values stays inside the braille block
            self.fb.push(char::from_u32(c).unwrap_or(' '));
        }
        self.fb.push('\n');

        &self.fb
    }

    fn xy_from(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    fn get_hex_value(x: usize, y: usize) -> u32 {
        match (x % 2, y % 4) {
            (0, 0) => 0x1,
            (1, 0) => 0x8,
            (0, 1) => 0x2,
            (1, 1) => 0x10,
            (0, 2) => 0x4,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => unreachable!(),
        }
    }
}

/// Maps world coordinates onto the pixels of a [`Camera`].
///
/// World `y` grows upwards, pixel `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// World point shown at the center of the frame
    pub center: Point,

    /// World units per pixel
    pub scale: f64,
}

impl Viewport {
    /// A viewport showing all of `sq` in a `w` by `h` pixel frame.
    pub fn fit(sq: &Square, w: usize, h: usize) -> Self {
        let sx = sq.width() / w.max(1) as f64;
        let sy = sq.height() / h.max(1) as f64;

        Viewport {
            center: sq.midpoint(),
            scale: sx.max(sy),
        }
    }

    pub fn to_pixel(&self, cam: &Camera, p: &Point) -> (i64, i64) {
        let x = (p.x - self.center.x) / self.scale + cam.width() as f64 / 2f64;
        let y = (self.center.y - p.y) / self.scale + cam.height() as f64 / 2f64;

        (x.floor() as i64, y.floor() as i64)
    }
}

pub fn draw_square(cam: &mut Camera, view: &Viewport, sq: &Square) {
    let a = view.to_pixel(cam, &Point::new(sq.from_x, sq.from_y));
    let b = view.to_pixel(cam, &Point::new(sq.to_x, sq.to_y));

    cam.draw_rect(a, b);
}

pub fn draw_selection(cam: &mut Camera, view: &Viewport, rect: &Aabb) {
    let a = view.to_pixel(cam, &rect.min());
    let b = view.to_pixel(cam, &rect.max());

    cam.draw_rect(a, b);
}

/// Draws every point of the layer under `top`, and with `layout` also every branch outline.
pub fn draw_layer(cam: &mut Camera, view: &Viewport, top: NodeRef<'_>, layout: bool) {
    let mut to_process = vec![top];

    while let Some(node) = to_process.pop() {
        if let Some(p) = node.point() {
            let (x, y) = view.to_pixel(cam, &p);
            cam.draw_pixel(x, y);
        }

        if let Some(sq) = node.square() {
            if layout {
                draw_square(cam, view, &sq);
            }
            to_process.extend(node.children().into_iter().flatten());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::quadtree::SkipQuadTree;
    use crate::quadtree::from_fn;

    #[test]
    fn blank_frame() {
        let mut cam = Camera::new(4, 8);

        assert_eq!(cam.render(), "\u{2800}\u{2800}\n\u{2800}\u{2800}\n");
    }

    #[test]
    fn pixels_map_to_dots() {
        let mut cam = Camera::new(2, 4);

        cam.draw_pixel(0, 0);
        cam.draw_pixel(1, 3);
        // clipped
        cam.draw_pixel(-1, 0);
        cam.draw_pixel(2, 0);

        assert_eq!(cam.render(), "\u{2881}\n");
    }

    #[test]
    fn viewport_fits_domain() {
        let cam = Camera::new(64, 48);
        let view = Viewport::fit(&Square::new(0, -320.0, 320.0, -240.0, 240.0), 64, 48);

        assert_eq!(view.scale, 10.0);
        assert_eq!(view.to_pixel(&cam, &Point::new(0.0, 0.0)), (32, 24));
        assert_eq!(view.to_pixel(&cam, &Point::new(-320.0, 240.0)), (0, 0));
    }

    #[test]
    fn layout_toggles_outlines() {
        let mut tree = SkipQuadTree::bounded_with_promotion(
            -320.0,
            320.0,
            -240.0,
            240.0,
            from_fn(|| false),
        )
        .unwrap();
        tree.insert(Point::new(-300.0, 200.0));
        tree.insert(Point::new(300.0, -200.0));

        let mut cam = Camera::new(64, 48);
        let view = Viewport::fit(&tree.domain(), 64, 48);
        let lit = |s: &str| s.chars().filter(|c| *c != '\u{2800}' && *c != '\n').count();

        draw_layer(&mut cam, &view, tree.layer(0).unwrap(), false);
        assert_eq!(lit(cam.render()), 2);

        cam.reset();
        draw_layer(&mut cam, &view, tree.layer(0).unwrap(), true);
        assert!(lit(cam.render()) > 2);
    }
}
