use crate::body::Body;

/// Semi-implicit Euler: velocity first, then position from the new velocity.
///
/// Forces are read but not cleared; the next force pass resets them.
pub fn step(bodies: &mut [Body], dt: f32) {
    for body in bodies.iter_mut() {
        let acceleration = body.force / body.mass;
        body.velocity += acceleration * dt;
        body.position += body.velocity * dt;
    }
}
