use cnweather_core::{ForecastDay, ForecastReport};
use crossterm::style::{Color, Stylize};

const TODAY_COLOR: Color = Color::Rgb {
    r: 56,
    g: 114,
    b: 185,
};

/// One line per day, daytime half first, e.g.
/// `星期五（10/18）多云 最高气温25℃ 微风 东北风 -> 晴 最低气温16℃ 3~4级 北风`.
pub fn format_day(day: &ForecastDay) -> String {
    format!(
        "{}（{}）{} 最高气温{} {} {} -> {} 最低气温{} {} {}",
        day.week_label,
        day.date,
        day.day.weather,
        day.day.max_temp,
        day.day.wind_speed,
        day.day.wind_dir,
        day.night.weather,
        day.night.min_temp,
        day.night.wind_speed,
        day.night.wind_dir,
    )
}

pub fn print_report(report: &ForecastReport) {
    println!("{}  {}", report.city_label, report.updated_at_label);

    for (i, day) in report.days.iter().enumerate() {
        let line = format_day(day);
        if i == 0 {
            println!("{}", line.as_str().with(TODAY_COLOR));
        } else {
            println!("{line}");
        }
    }
}

pub fn print_city_list(province: &str, cities: &[&str]) {
    println!("以下是{province}的所有城市/地区名：");
    for city in cities {
        println!("{city}");
    }
}
