//! Hierarchical circle packing.
//!
//! Siblings are placed with the front-chain algorithm (Wang et al.) and
//! wrapped in their smallest enclosing circle (randomized incremental
//! enclosure). The shuffle before enclosure draws from a fixed-seed LCG, so
//! the same tree always packs to the same geometry.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl Circle {
    pub const fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }
}

/// Linear congruential generator, `s = (1664525 * s + 1013904223) mod 2^32`.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    const MODULUS: u64 = 1 << 32;

    pub fn new() -> Self {
        Self { state: 1 }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = (1_664_525 * self.state + 1_013_904_223) % Self::MODULUS;
        self.state as f64 / Self::MODULUS as f64
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new()
    }
}

fn shuffle<T>(items: &mut [T], random: &mut Lcg) {
    let mut remaining = items.len();
    while remaining > 0 {
        let pick = (random.next_f64() * remaining as f64) as usize;
        remaining -= 1;
        items.swap(remaining, pick);
    }
}

// ---------------------------------------------------------------------------
// Enclosure
// ---------------------------------------------------------------------------

fn encloses_not(a: &Circle, b: &Circle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: &Circle, b: &Circle) -> bool {
    let dr = a.r - b.r + a.r.max(b.r).max(1.0) * 1e-9;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: &Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|b| encloses_weak(a, b))
}

fn enclose_basis(basis: &[Circle]) -> Circle {
    match basis {
        [a] => *a,
        [a, b] => enclose_basis2(a, b),
        [a, b, c] => enclose_basis3(a, b, c),
        _ => Circle::default(),
    }
}

fn enclose_basis2(a: &Circle, b: &Circle) -> Circle {
    let x21 = b.x - a.x;
    let y21 = b.y - a.y;
    let r21 = b.r - a.r;
    let l = (x21 * x21 + y21 * y21).sqrt();
    if l == 0.0 {
        return if a.r >= b.r { *a } else { *b };
    }
    Circle::new(
        (a.x + b.x + x21 / l * r21) / 2.0,
        (a.y + b.y + y21 / l * r21) / 2.0,
        (l + a.r + b.r) / 2.0,
    )
}

fn enclose_basis3(a: &Circle, b: &Circle, c: &Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let (x3, y3, r3) = (c.x, c.y, c.r);
    let a2 = x1 - x2;
    let a3 = x1 - x3;
    let b2 = y1 - y2;
    let b3 = y1 - y3;
    let c2 = r2 - r1;
    let c3 = r3 - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - x2 * x2 - y2 * y2 + r2 * r2;
    let d3 = d1 - x3 * x3 - y3 * y3 + r3 * r3;
    let ab = a3 * b2 - a2 * b3;
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = -(if qa.abs() > 1e-6 {
        (qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
    } else {
        qc / qb
    });
    Circle::new(x1 + xa + xb * r, y1 + ya + yb * r, r)
}

fn extend_basis(basis: &[Circle], p: Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(&p, basis) {
        return Some(vec![p]);
    }

    for b in basis {
        if encloses_not(&p, b) && encloses_weak_all(&enclose_basis2(b, &p), basis) {
            return Some(vec![*b, p]);
        }
    }

    for i in 0..basis.len().saturating_sub(1) {
        for j in (i + 1)..basis.len() {
            let (bi, bj) = (&basis[i], &basis[j]);
            if encloses_not(&enclose_basis2(bi, bj), &p)
                && encloses_not(&enclose_basis2(bi, &p), bj)
                && encloses_not(&enclose_basis2(bj, &p), bi)
                && encloses_weak_all(&enclose_basis3(bi, bj, &p), basis)
            {
                return Some(vec![*bi, *bj, p]);
            }
        }
    }

    None
}

/// Smallest circle enclosing every circle in `circles`.
pub fn enclose(circles: &[Circle], random: &mut Lcg) -> Circle {
    let mut shuffled = circles.to_vec();
    shuffle(&mut shuffled, random);

    let mut basis: Vec<Circle> = Vec::new();
    let mut enclosing: Option<Circle> = None;
    let mut i = 0;
    while i < shuffled.len() {
        let p = shuffled[i];
        match enclosing {
            Some(e) if encloses_weak(&e, &p) => i += 1,
            _ => match extend_basis(&basis, p) {
                Some(extended) => {
                    basis = extended;
                    enclosing = Some(enclose_basis(&basis));
                    i = 0;
                }
                None => {
                    // 數值誤差時退回保守外接圓
                    let center = enclosing.unwrap_or(p);
                    let r = shuffled
                        .iter()
                        .map(|c| ((c.x - center.x).powi(2) + (c.y - center.y).powi(2)).sqrt() + c.r)
                        .fold(0.0, f64::max);
                    return Circle::new(center.x, center.y, r);
                }
            },
        }
    }

    enclosing.unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Siblings
// ---------------------------------------------------------------------------

/// Positions `c` tangent to both `a` and `b`.
fn place(b: Circle, a: Circle, c: &mut Circle) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 != 0.0 {
        let a2 = (a.r + c.r).powi(2);
        let b2 = (b.r + c.r).powi(2);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            c.x = b.x - x * dx - y * dy;
            c.y = b.y - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            c.x = a.x + x * dx - y * dy;
            c.y = a.y + x * dy + y * dx;
        }
    } else {
        c.x = a.x + c.r;
        c.y = a.y;
    }
}

fn intersects(a: &Circle, b: &Circle) -> bool {
    let dr = a.r + b.r - 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

#[derive(Debug, Clone, Copy)]
struct Link {
    circle: usize,
    next: usize,
    prev: usize,
}

/// Squared distance from the origin to the weighted midpoint of `node` and
/// its successor on the front-chain.
fn score(chain: &[Link], circles: &[Circle], node: usize) -> f64 {
    let p = circles[chain[node].circle];
    let q = circles[chain[chain[node].next].circle];
    let ab = p.r + q.r;
    let dx = (p.x * q.r + q.x * p.r) / ab;
    let dy = (p.y * q.r + q.y * p.r) / ab;
    dx * dx + dy * dy
}

/// Packs `circles` around the origin in place and returns the radius of
/// their enclosing circle.
pub fn pack_siblings(circles: &mut [Circle], random: &mut Lcg) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        return circles[0].r + circles[1].r;
    }

    let (first, second) = (circles[0], circles[1]);
    place(second, first, &mut circles[2]);

    // front-chain: 0 -> 1 -> 2 -> 0
    let mut chain = vec![
        Link { circle: 0, next: 1, prev: 2 },
        Link { circle: 1, next: 2, prev: 0 },
        Link { circle: 2, next: 0, prev: 1 },
    ];
    let mut a = 0usize;
    let mut b = 1usize;

    let mut i = 3;
    'pack: while i < n {
        let (ca, cb) = (circles[chain[a].circle], circles[chain[b].circle]);
        place(ca, cb, &mut circles[i]);
        let c = chain.len();
        chain.push(Link {
            circle: i,
            next: c,
            prev: c,
        });

        // 沿 front-chain 找最近的相交圓
        let mut j = chain[b].next;
        let mut k = chain[a].prev;
        let mut sj = cb.r;
        let mut sk = ca.r;
        loop {
            if sj <= sk {
                if intersects(&circles[chain[j].circle], &circles[i]) {
                    b = j;
                    chain[a].next = b;
                    chain[b].prev = a;
                    chain.pop();
                    continue 'pack;
                }
                sj += circles[chain[j].circle].r;
                j = chain[j].next;
            } else {
                if intersects(&circles[chain[k].circle], &circles[i]) {
                    a = k;
                    chain[a].next = b;
                    chain[b].prev = a;
                    chain.pop();
                    continue 'pack;
                }
                sk += circles[chain[k].circle].r;
                k = chain[k].prev;
            }
            if j == chain[k].next {
                break;
            }
        }

        chain[c].prev = a;
        chain[c].next = b;
        chain[a].next = c;
        chain[b].prev = c;
        b = c;

        let mut best = score(&chain, circles, a);
        let mut cursor = chain[c].next;
        while cursor != b {
            let candidate = score(&chain, circles, cursor);
            if candidate < best {
                a = cursor;
                best = candidate;
            }
            cursor = chain[cursor].next;
        }
        b = chain[a].next;
        i += 1;
    }

    let mut front = vec![circles[chain[b].circle]];
    let mut cursor = chain[b].next;
    while cursor != b {
        front.push(circles[chain[cursor].circle]);
        cursor = chain[cursor].next;
    }
    let enclosing = enclose(&front, random);

    for circle in circles.iter_mut() {
        circle.x -= enclosing.x;
        circle.y -= enclosing.y;
    }
    enclosing.r
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

/// Node of a tree being packed. After [`pack`], `x`/`y` are absolute
/// coordinates inside the `width x height` box and `r` is the final radius.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackNode {
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub children: Vec<PackNode>,
}

impl PackNode {
    pub fn leaf(value: f64) -> Self {
        Self {
            value: value.max(0.0),
            ..Self::default()
        }
    }

    /// Inner node; its value is the sum of its children.
    pub fn branch(children: Vec<PackNode>) -> Self {
        Self {
            value: children.iter().map(|child| child.value).sum(),
            children,
            ..Self::default()
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

fn assign_leaf_radii(node: &mut PackNode) {
    if node.is_leaf() {
        node.r = node.value.max(0.0).sqrt();
    } else {
        node.children.iter_mut().for_each(assign_leaf_radii);
    }
}

fn pack_children(node: &mut PackNode, padding: f64, random: &mut Lcg) {
    if node.is_leaf() {
        return;
    }
    for child in node.children.iter_mut() {
        pack_children(child, padding, random);
    }

    let pad = if padding.is_finite() { padding } else { 0.0 };
    let mut circles: Vec<Circle> = node
        .children
        .iter()
        .map(|child| Circle::new(child.x, child.y, child.r + pad))
        .collect();
    let enclosing = pack_siblings(&mut circles, random);
    for (child, circle) in node.children.iter_mut().zip(circles) {
        child.x = circle.x;
        child.y = circle.y;
    }
    node.r = enclosing + pad;
}

fn translate_children(node: &mut PackNode, k: f64) {
    for child in node.children.iter_mut() {
        child.r *= k;
        child.x = node.x + k * child.x;
        child.y = node.y + k * child.y;
        translate_children(child, k);
    }
}

/// Packs the tree rooted at `root` into a `width x height` box.
///
/// Runs an unpadded pass to estimate the root radius, a padded pass, and
/// finally scales everything so the root fills the shorter side. A tree whose
/// values are all zero collapses to zero radii at the box center.
pub fn pack(root: &mut PackNode, width: f64, height: f64, padding: f64) {
    let mut random = Lcg::new();
    let side = width.min(height);

    root.x = width / 2.0;
    root.y = height / 2.0;
    assign_leaf_radii(root);
    pack_children(root, 0.0, &mut random);
    pack_children(root, padding * root.r / side, &mut random);

    let k = if root.r > 0.0 { side / (2.0 * root.r) } else { 0.0 };
    root.r *= k;
    translate_children(root, k);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap(a: &Circle, b: &Circle) -> f64 {
        let distance = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
        a.r + b.r - distance
    }

    #[test]
    fn test_lcg_first_draws() {
        let mut random = Lcg::new();
        // (1664525 + 1013904223) / 2^32
        assert!((random.next_f64() - 1_015_568_748.0 / 4_294_967_296.0).abs() < 1e-15);
        let second = random.next_f64();
        assert!((0.0..1.0).contains(&second));
    }

    #[test]
    fn test_pack_two_siblings_side_by_side() {
        let mut circles = vec![Circle::new(0.0, 0.0, 2.0), Circle::new(0.0, 0.0, 1.0)];
        let r = pack_siblings(&mut circles, &mut Lcg::new());
        assert_eq!(r, 3.0);
        assert_eq!(circles[0].x, -1.0);
        assert_eq!(circles[1].x, 2.0);
    }

    #[test]
    fn test_packed_siblings_do_not_overlap_and_are_enclosed() {
        let mut circles: Vec<Circle> = [5.0, 3.0, 4.0, 1.0, 2.5, 6.0, 0.5]
            .iter()
            .map(|&r| Circle::new(0.0, 0.0, r))
            .collect();
        let r = pack_siblings(&mut circles, &mut Lcg::new());

        for (i, a) in circles.iter().enumerate() {
            let reach = (a.x.powi(2) + a.y.powi(2)).sqrt() + a.r;
            assert!(reach <= r + 1e-6, "circle {i} escapes enclosure");
            for b in circles.iter().skip(i + 1) {
                assert!(overlap(a, b) < 1e-6);
            }
        }
    }

    #[test]
    fn test_enclose_single_and_pair() {
        let mut random = Lcg::new();
        let single = enclose(&[Circle::new(1.0, 2.0, 3.0)], &mut random);
        assert_eq!(single, Circle::new(1.0, 2.0, 3.0));

        let pair = enclose(
            &[Circle::new(-1.0, 0.0, 1.0), Circle::new(1.0, 0.0, 1.0)],
            &mut random,
        );
        assert!((pair.r - 2.0).abs() < 1e-9);
        assert!(pair.x.abs() < 1e-9);
    }

    #[test]
    fn test_pack_is_deterministic() {
        let tree = || {
            PackNode::branch(vec![
                PackNode::branch(vec![PackNode::leaf(400.0), PackNode::leaf(100.0), PackNode::leaf(50.0)]),
                PackNode::branch(vec![PackNode::leaf(900.0)]),
                PackNode::branch(vec![PackNode::leaf(10.0), PackNode::leaf(20.0), PackNode::leaf(30.0), PackNode::leaf(5.0)]),
            ])
        };
        let mut first = tree();
        let mut second = tree();
        pack(&mut first, 1000.0, 300.0, 3.0);
        pack(&mut second, 1000.0, 300.0, 3.0);

        assert_eq!(first, second);
        assert!((first.r - 150.0).abs() < 1e-9);
        assert_eq!((first.x, first.y), (500.0, 150.0));
    }

    #[test]
    fn test_pack_all_zero_collapses() {
        let mut root = PackNode::branch(vec![
            PackNode::branch(vec![PackNode::leaf(0.0), PackNode::leaf(0.0)]),
            PackNode::branch(vec![PackNode::leaf(0.0)]),
        ]);
        pack(&mut root, 1000.0, 300.0, 3.0);

        assert_eq!(root.r, 0.0);
        for alliance in &root.children {
            assert_eq!(alliance.r, 0.0);
            assert_eq!((alliance.x, alliance.y), (500.0, 150.0));
            assert!(alliance.children.iter().all(|party| party.r == 0.0));
        }
    }

    #[test]
    fn test_leaf_area_follows_value() {
        let mut root = PackNode::branch(vec![PackNode::branch(vec![
            PackNode::leaf(400.0),
            PackNode::leaf(100.0),
        ])]);
        pack(&mut root, 500.0, 500.0, 0.0);

        let parties = &root.children[0].children;
        let ratio = parties[0].r / parties[1].r;
        assert!((ratio - 2.0).abs() < 1e-9);
    }
}
