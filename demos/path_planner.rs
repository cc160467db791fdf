extern crate path_spline;

use path_spline::Spline;

// x1, y1, t1, x2, y2, t2, ...
const WAYPOINTS: [f64; 12] = [
    0.0, 0.0, 0.0,
    1.0, 1.0, 1.0,
    2.0, 3.0, 2.0,
    0.0, 4.0, 3.0,
];

fn main() {

    let spline = Spline::from_flat(&WAYPOINTS).unwrap();

    let number_of_steps = 30;
    let step = (spline.end_time() - spline.start_time()) / number_of_steps as f64;

    println!("t;x;y;vx;vy;ax;ay");
    for i in 0..=number_of_steps {
        let t = spline.start_time() + step * i as f64;
        println!(
            "{:.2};{:.3};{:.3};{:.3};{:.3};{:.3};{:.3}",
            t,
            spline.x(t),
            spline.y(t),
            spline.velocity_x(t),
            spline.velocity_y(t),
            spline.acceleration_x(t),
            spline.acceleration_y(t)
        );
    }
}
